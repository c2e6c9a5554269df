//! A mocked HTTP context bundling the request with its ambient stores.

use std::sync::Arc;

use trellis_core::TestServices;

use crate::mocks::cache::MemoryCacheMock;
use crate::mocks::session::{MockSession, TempData};
use crate::mocks::viewdata::ViewData;
use crate::request::SimulatedRequest;

/// Everything a controller under test can reach: the simulated request plus
/// mocked session, temp data, view data and cache, sharing the fixture's
/// service container.
pub struct MockHttpContext {
    pub request: SimulatedRequest,
    pub session: Arc<MockSession>,
    pub temp_data: Arc<TempData>,
    pub view_data: Arc<ViewData>,
    pub cache: Arc<MemoryCacheMock>,
    services: Arc<TestServices>,
}

impl MockHttpContext {
    pub fn new(request: SimulatedRequest) -> Self {
        Self::with_services(request, Arc::new(TestServices::default()))
    }

    pub fn with_services(request: SimulatedRequest, services: Arc<TestServices>) -> Self {
        Self {
            request,
            session: Arc::new(MockSession::new()),
            temp_data: Arc::new(TempData::new()),
            view_data: Arc::new(ViewData::new()),
            cache: Arc::new(MemoryCacheMock::new()),
            services,
        }
    }

    pub fn services(&self) -> &Arc<TestServices> {
        &self.services
    }
}

impl std::fmt::Debug for MockHttpContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockHttpContext")
            .field("method", &self.request.method)
            .field("path", &self.request.path)
            .field("session_entries", &self.session.len())
            .finish()
    }
}
