pub mod resolver;
pub mod selector;
pub mod skeleton;

// Re-exports for convenience
pub use resolver::resolve_position;
pub use selector::select_tracked;
