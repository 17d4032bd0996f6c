//! Example: resolve the state a visitor would see for a URL
//!
//! ```text
//! cargo run -p cv-session --example inspect -- config.json "https://docs.example/guide?t-show=advanced"
//! ```

use anyhow::Context;
use cv_dom::Document;
use cv_session::{Session, SessionOptions};
use cv_state::{Config, MemoryStorage};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let (Some(config_path), Some(url)) = (args.next(), args.next()) else {
        anyhow::bail!("usage: inspect <config.json> <page-url>");
    };

    let json = std::fs::read_to_string(&config_path)
        .with_context(|| format!("reading {config_path}"))?;
    let config = Config::from_json(&json).context("parsing config")?;

    let doc = Document::new(&url);
    let session = Session::start(SessionOptions::new(config), MemoryStorage::new(), &doc);

    println!("CustomViews session v{}", cv_session::VERSION);
    println!("{}", serde_json::to_string_pretty(session.state())?);
    println!("share: {}", session.share_url(&doc)?);
    Ok(())
}
