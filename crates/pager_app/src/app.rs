use std::io::{self, BufRead, Write};
use std::sync::Arc;

use pager_core::AggregatedStatus;
use pager_engine::{
    load_snapshot, save_snapshot, EngineHandle, FeedItem, FeedStore, FetchError, Listing,
    MemoryFeedStore, PersistError, RefreshState,
};
use pager_logging::{pager_info, pager_warn};
use thiserror::Error;

use crate::config::AppConfig;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("could not set up fetcher: {0}")]
    Fetcher(#[from] FetchError),
    #[error("could not save feed: {0}")]
    Persist(#[from] PersistError),
}

/// One line of user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Next,
    Previous,
    Retry,
    Refresh,
    List,
    Quit,
}

impl Command {
    fn parse(line: &str) -> Option<Self> {
        match line.trim() {
            "n" | "next" => Some(Command::Next),
            "p" | "prev" | "previous" => Some(Command::Previous),
            "r" | "retry" => Some(Command::Retry),
            "f" | "refresh" => Some(Command::Refresh),
            "l" | "list" => Some(Command::List),
            "q" | "quit" | "exit" => Some(Command::Quit),
            _ => None,
        }
    }
}

pub fn run(config: AppConfig) -> Result<(), AppError> {
    let engine = EngineHandle::new()?;

    let saved = load_snapshot(&config.data_dir).unwrap_or_else(|err| {
        pager_warn!("Ignoring unreadable snapshot in {:?}: {}", config.data_dir, err);
        Vec::new()
    });
    let store = Arc::new(MemoryFeedStore::with_items(saved));
    let repository = engine.repository(config.fetch.clone(), store.clone())?;
    let listing = repository.listing();
    pager_info!(
        "Session started for r/{} with {} cached items",
        config.fetch.subreddit,
        store.len()
    );

    spawn_status_printers(&engine, &listing, store.clone());

    println!("r/{}", config.fetch.subreddit);
    if !listing.load_initial() {
        print_items(&listing.items());
    }
    print_help();

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        match Command::parse(&line) {
            Some(Command::Next) => {
                if !listing.load_next() {
                    println!("next page already loading");
                }
            }
            Some(Command::Previous) => {
                if !listing.load_previous() {
                    println!("previous page already loading");
                }
            }
            Some(Command::Retry) => match listing.retry() {
                0 => println!("nothing to retry"),
                count => println!("retrying {count} request(s)"),
            },
            Some(Command::Refresh) => {
                if !listing.refresh() {
                    println!("refresh already in progress");
                }
            }
            Some(Command::List) => print_items(&listing.items()),
            Some(Command::Quit) => break,
            None => print_help(),
        }
    }

    save_snapshot(&config.data_dir, &store.items())?;
    Ok(())
}

fn spawn_status_printers(engine: &EngineHandle, listing: &Listing, store: Arc<MemoryFeedStore>) {
    let handle = engine.handle();

    let mut network = listing.network_state();
    let network_store = store.clone();
    handle.spawn(async move {
        while let Some(status) = network.next().await {
            match status {
                AggregatedStatus::Loaded => {
                    println!("[loaded] {} items", network_store.len());
                }
                AggregatedStatus::Error { message } => {
                    println!("[error] {message} (type r to retry)");
                }
                other => println!("[{other}]"),
            }
            flush_stdout();
        }
    });

    let mut refresh = listing.refresh_state();
    handle.spawn(async move {
        while refresh.changed().await.is_ok() {
            let state = refresh.borrow_and_update().clone();
            println!("[{state}]");
            if state == RefreshState::Loaded {
                print_items(&store.items());
            }
            flush_stdout();
        }
    });
}

fn print_items(items: &[FeedItem]) {
    if items.is_empty() {
        println!("(no items)");
        return;
    }
    for item in items {
        println!(
            "{:>5} | {:>5} pts | {:>4} comments | {} ({})",
            item.index_in_response, item.score, item.num_comments, item.title, item.author
        );
    }
}

fn print_help() {
    println!("commands: n=next page, p=previous page, r=retry, f=refresh, l=list, q=quit");
    flush_stdout();
}

fn flush_stdout() {
    let _ = io::stdout().flush();
}
