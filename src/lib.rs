// Library exports for the Divercite agent
// The server binary, the match tools and the integration tests all build on
// these modules.

pub mod arena;
pub mod bot;
pub mod city;
pub mod config;
pub mod debug_logger;
pub mod depth;
pub mod game;
pub mod heuristics;
pub mod replay;
pub mod search;
pub mod simple_profiler;
pub mod tournament;
pub mod types;
