// Not every utils is used in every test, so we allow dead code
#![allow(unused_imports, dead_code)]

mod test_setup;
pub use test_setup::*;
mod utils;
pub use utils::*;
mod failing_storage;
pub use failing_storage::*;
mod fake_asset_host;
pub use fake_asset_host::*;
