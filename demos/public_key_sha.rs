//! Print the public key SHA-256 fingerprint of a site or a PEM public key.
//!
//! ```text
//! $ cargo run --example public_key_sha https://www.site.com
//! Getting public key sha for: https://www.site.com
//! sha: 7A:5C:EC:30:0E:B0:42:6E:F9:2E:B7:8A:FA:9A:F6:28:1E:0C:FB:9F:86:A5:3D:45:75:24:86:8B:56:F2:67:B3
//!
//! $ cargo run --example public_key_sha public-key.pem
//! ```

use certpin::fetch_server_certificate;
use certpin::tls::fingerprint::{certificate_fingerprint, public_key_pem_fingerprint};
use url::Url;

async fn public_key_sha(target: &str) -> Result<String, Box<dyn std::error::Error>> {
    if target.starts_with("http://") {
        return Err(format!("Couldn't get a certificate from a http site: {target}").into());
    }
    if target.starts_with("https://") {
        let cert = fetch_server_certificate(&Url::parse(target)?).await?;
        return Ok(certificate_fingerprint(&cert)?);
    }
    let pem = std::fs::read(target)?;
    Ok(public_key_pem_fingerprint(&pem)?)
}

#[tokio::main]
async fn main() {
    let Some(target) = std::env::args().nth(1) else {
        println!("Error: Missing parameter to get public key sha.");
        println!(" usages:");
        println!("   public_key_sha https://www.site.com");
        println!("   public_key_sha public-key.pem");
        return;
    };

    println!("Getting public key sha for: {target}");
    match public_key_sha(&target).await {
        Ok(sha) => println!("sha: {sha}"),
        Err(e) => {
            println!("Error: {e}");
            std::process::exit(1);
        }
    }
}
