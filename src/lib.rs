// viki-ui - component runtime for the Viki agent admin console
//
// Architecture:
// - Render tree (dom): isolated roots, markup parser, selectors, events
// - Resource fetchers: component templates/stylesheets from disk, HTTP or memory
// - Lifecycle: builds each component's root exactly once (fetch, parse, style)
// - API client: explicitly configured REST client with typed endpoints
// - Views: LLM/Tools/RAG/Agents/Chat canvases and navigation, created by tag
//   through the component registry
// - Renderers: markdown and allow-list HTML sanitizing
// - Ambient: TOML config, tracing setup, CLI and a static asset server

pub mod api;
pub mod cli;
pub mod config;
pub mod dom;
pub mod lifecycle;
pub mod logging;
pub mod registry;
pub mod render;
pub mod report;
pub mod resource;
pub mod serve;
pub mod views;

pub use lifecycle::{BuildHandle, ComponentInstance, ComponentLoader, InitOptions, LifecycleState};
pub use registry::{AppContext, ComponentRegistry};
