use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "lab-cli")]
#[command(about = "Send payloads to a running mitigation lab", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://127.0.0.1:5000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a command through a cmdi route
    Exec {
        /// vulnerable, whitelist, regex_filter, escape_shell, subprocess_safe,
        /// length_restriction or blacklist_keywords
        #[arg(short, long, default_value = "vulnerable")]
        strategy: String,
        command: String,
    },
    /// Fetch an IDOR document as a user
    Document {
        /// vulnerable, direct-auth, acl, query-filter, session-based or abac
        #[arg(short, long, default_value = "vulnerable")]
        policy: String,
        #[arg(long, default_value = "alice")]
        user: String,
        #[arg(long, default_value = "alice123")]
        password: String,
        id: u32,
    },
    /// Read a file through the LFI routes
    ReadFile {
        /// Protection method; the vulnerable route is used when omitted
        #[arg(short, long)]
        method: Option<String>,
        file: String,
    },
    /// Log in through a SQLi route
    Login {
        /// Route suffix, e.g. insecure/login_string_format or secure/login_parameterized
        #[arg(short, long, default_value = "insecure/login_string_format")]
        route: String,
        username: String,
        #[arg(default_value = "")]
        password: String,
    },
    /// Ask an SSRF route to fetch a URL
    Fetch {
        /// vulnerable, or a protection such as blocklist or allowlist
        #[arg(short, long, default_value = "vulnerable")]
        protection: String,
        #[arg(short = 'X', long, default_value = "GET")]
        method: String,
        url: String,
    },
    /// Submit input to an XSS route
    Render {
        /// Route, e.g. vulnerable, escape-html, csp-protected
        #[arg(short, long, default_value = "vulnerable")]
        route: String,
        #[arg(long, default_value = "vulnerable")]
        xss_type: String,
        input: String,
    },
    /// Post an XML document to an XXE route
    ParseXml {
        /// Route suffix, e.g. insecure/parse or secure/use_defusedxml
        #[arg(short, long, default_value = "insecure/parse")]
        route: String,
        file: PathBuf,
    },
    /// Upload a file through the upload routes
    Upload {
        /// Route suffix, e.g. upload-insecure or upload-secure/magic-number
        #[arg(short, long, default_value = "upload-insecure")]
        route: String,
        /// Content type declared for the part
        #[arg(short, long, default_value = "application/octet-stream")]
        content_type: String,
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let res = match cli.command {
        Commands::Exec { strategy, command } => {
            let path = if strategy == "vulnerable" {
                "vulnerable/exec".to_string()
            } else {
                format!("secure/{}", strategy)
            };
            client
                .post(format!("{}/cmdi/{}", base, path))
                .json(&json!({ "command": command }))
                .send()
                .await?
        }
        Commands::Document { policy, user, password, id } => {
            let path = if policy == "vulnerable" {
                format!("vulnerable/document/{}", id)
            } else {
                format!("secure/{}/document/{}", policy, id)
            };
            client
                .get(format!("{}/idor/{}", base, path))
                .basic_auth(user, Some(password))
                .send()
                .await?
        }
        Commands::ReadFile { method, file } => match method {
            Some(method) => {
                client
                    .get(format!("{}/lfi/protected/lfi", base))
                    .query(&[("file", file), ("method", method)])
                    .send()
                    .await?
            }
            None => {
                client
                    .get(format!("{}/lfi/vulnerable/lfi", base))
                    .query(&[("file", file)])
                    .send()
                    .await?
            }
        },
        Commands::Login { route, username, password } => {
            client
                .post(format!("{}/sqli/{}", base, route.trim_start_matches('/')))
                .json(&json!({ "username": username, "password": password }))
                .send()
                .await?
        }
        Commands::Fetch { protection, method, url } => {
            let path = if protection == "vulnerable" {
                "vulnerable/ssrf".to_string()
            } else {
                format!("protected/{}", protection)
            };
            client
                .post(format!("{}/ssrf/{}", base, path))
                .json(&json!({ "url": url, "method": method.to_uppercase() }))
                .send()
                .await?
        }
        Commands::Render { route, xss_type, input } => {
            client
                .post(format!("{}/xss/{}", base, route.trim_start_matches('/')))
                .form(&[("input", input), ("xss_type", xss_type)])
                .send()
                .await?
        }
        Commands::ParseXml { route, file } => {
            let body = tokio::fs::read(&file).await?;
            client
                .post(format!("{}/xxe/{}", base, route.trim_start_matches('/')))
                .header(reqwest::header::CONTENT_TYPE, "application/xml")
                .body(body)
                .send()
                .await?
        }
        Commands::Upload { route, content_type, file } => {
            let data = tokio::fs::read(&file).await?;
            let file_name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "upload.bin".to_string());
            let part = reqwest::multipart::Part::bytes(data)
                .file_name(file_name)
                .mime_str(&content_type)?;
            client
                .post(format!("{}/upload/{}", base, route.trim_start_matches('/')))
                .multipart(reqwest::multipart::Form::new().part("file", part))
                .send()
                .await?
        }
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    if !status.is_success() {
        eprintln!("Status: {}", status);
    }

    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }
    Ok(())
}
