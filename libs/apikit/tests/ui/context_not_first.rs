//! The request context must come first.

use apikit::{Dispatcher, ErrorCodeTable, PageQuery, PageResult};

#[derive(Debug)]
struct Nope;

impl std::fmt::Display for Nope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("nope")
    }
}

impl std::error::Error for Nope {}

async fn handler(_page: PageQuery) -> Result<PageResult<String>, Nope> {
    Ok(PageResult::empty())
}

fn main() {
    let dispatcher = Dispatcher::new(ErrorCodeTable::builder().build());
    let _ = dispatcher.handle(handler);
}
