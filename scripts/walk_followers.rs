//! Follower Walk Utility
//!
//! Walks every follower id of a user with cursor pagination and prints one id
//! per line. Interrupted walks can be resumed with the cursor printed on exit.
//!
//! ```bash
//! xapi_access_token=... cargo run --bin walk_followers -- rustlang
//! xapi_access_token=... cargo run --bin walk_followers -- rustlang --resume 1374004777531007833
//! ```

use std::env;

use log::{error, info};
use twitter_rest::{ClientConfig, Cursor, TwitterClient, UserRef};

/// Parses `<screen_name> [--resume <cursor>] [--max-pages <n>]`.
fn parse_args() -> Result<(String, Option<Cursor>, Option<usize>), Box<dyn std::error::Error + Send + Sync>> {
    let mut args = env::args().skip(1);
    let screen_name = args
        .next()
        .ok_or("usage: walk_followers <screen_name> [--resume <cursor>] [--max-pages <n>]")?;

    let mut resume = None;
    let mut max_pages = None;
    while let Some(flag) = args.next() {
        let value = args.next().ok_or(format!("{} needs a value", flag))?;
        match flag.as_str() {
            "--resume" => resume = Some(value.parse::<Cursor>()?),
            "--max-pages" => max_pages = Some(value.parse::<usize>()?),
            other => return Err(format!("unknown flag {}", other).into()),
        }
    }

    Ok((screen_name, resume, max_pages))
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    env_logger::init();

    let (screen_name, resume, max_pages) = parse_args()?;
    let config = ClientConfig::from_env()?;

    // The blocking traversal drives requests from this thread; the runtime
    // only hosts the HTTP tasks.
    let runtime = tokio::runtime::Runtime::new()?;
    let client = TwitterClient::from_config(&config, runtime.handle().clone())?;

    let mut traversal = client.followers_ids(UserRef::screen_name(screen_name.as_str()));
    if let Some(cursor) = resume {
        info!("Resuming follower walk at cursor {}", cursor);
        traversal = traversal.starting_at(cursor);
    }
    if let Some(pages) = max_pages {
        traversal = traversal.max_pages(pages);
    }

    let mut ids = traversal.items_blocking();
    let mut count: u64 = 0;
    // `while let` keeps `ids` borrowable for the resume cursor on failure.
    while let Some(id) = ids.next() {
        match id {
            Ok(id) => {
                println!("{}", id);
                count += 1;
            }
            Err(e) => {
                error!("Follower walk for @{} stopped: {}", screen_name, e);
                if let Some(cursor) = ids.traversal().resume_cursor() {
                    eprintln!("Resume with: --resume {}", cursor);
                }
                return Err(e.into());
            }
        }
    }

    info!("Fetched {} follower ids of @{}", count, screen_name);
    if let Some(cursor) = ids.traversal().resume_cursor() {
        eprintln!("Stopped early; resume with: --resume {}", cursor);
    }

    Ok(())
}
