//! Fetch a URL only if the server key matches a pinned fingerprint.
//!
//! ```text
//! $ cargo run --example pinned_get https://www.site.com 7A:5C:EC:...:67:B3
//! ```

use certpin::PinnedClient;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let (Some(url), Some(sha)) = (args.next(), args.next()) else {
        println!("usage: pinned_get <https-url> <sha> [<sha>...]");
        return Ok(());
    };

    let client = args
        .fold(PinnedClient::builder().fingerprint(sha), |builder, sha| {
            builder.fingerprint(sha)
        })
        .timeout(Duration::from_secs(30))
        .build()?;

    match client.get(&url).send().await {
        Ok(resp) => {
            println!("Status: {}", resp.status());
            println!("Body: {} bytes", resp.bytes().len());
        }
        Err(e) if e.is_pinning_mismatch() => println!("Refused: server key is not pinned"),
        Err(e) => return Err(e.into()),
    }
    Ok(())
}
