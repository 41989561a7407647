//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use crate::tools::cache::{
    CacheEntriesParams, CacheInsertParams, CacheLookupParams, entries_impl, insert_impl, lookup_impl, metrics_impl,
    stats_impl,
};
use hoardcache_core::MediaCache;

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

/// The main MCP server handler for hoardcache.
#[derive(Clone)]
pub struct HoardCacheServer {
    cache: MediaCache,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl HoardCacheServer {
    /// Create a new server handler over an open cache.
    pub fn new(cache: MediaCache) -> Self {
        Self { cache, tool_router: Self::tool_router() }
    }

    /// Look up cached media for one representation of a post.
    #[tool(description = "Look up cached media for a post. Thumbnails are returned only when allow_inline is set.")]
    async fn cache_lookup(&self, params: Parameters<CacheLookupParams>) -> Result<CallToolResult, McpError> {
        lookup_impl(&self.cache, params.0).await
    }

    #[tool(description = "List every cached row for a post, oldest first.")]
    async fn cache_entries(&self, params: Parameters<CacheEntriesParams>) -> Result<CallToolResult, McpError> {
        entries_impl(&self.cache, params.0).await
    }

    /// Record an uploaded media object.
    ///
    /// Without `replace`, a duplicate key fails where the schema revision
    /// enforces uniqueness.
    #[tool(description = "Record uploaded media for a post. Set replace to overwrite the existing entry.")]
    async fn cache_insert(&self, params: Parameters<CacheInsertParams>) -> Result<CallToolResult, McpError> {
        insert_impl(&self.cache, params.0).await
    }

    #[tool(description = "Report the cache schema revision and number of cached rows.")]
    async fn cache_stats(&self) -> Result<CallToolResult, McpError> {
        stats_impl(&self.cache).await
    }

    #[tool(description = "Prometheus metrics for the cache, in text exposition format.")]
    async fn cache_metrics(&self) -> Result<CallToolResult, McpError> {
        metrics_impl().await
    }
}

impl ServerHandler for HoardCacheServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "hoardcache".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
