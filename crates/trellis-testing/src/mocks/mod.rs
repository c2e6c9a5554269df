//! In-memory stand-ins for the ambient stores a controller pipeline touches:
//! session state, temp data, view data, and caches. All of them are plain
//! values owned by the fixture, never process-global.

pub mod cache;
pub mod context;
pub mod session;
pub mod viewdata;

pub use cache::{CacheError, DistributedCache, MemoryCacheMock, MockDistributedCache};
pub use context::MockHttpContext;
pub use session::{MockSession, SessionValue, TempData};
pub use viewdata::ViewData;
