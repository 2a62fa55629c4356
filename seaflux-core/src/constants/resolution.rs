//! Resolver Limits

/// Deepest nesting of aggregate and composite strategies.
///
/// Validated sensor graphs are acyclic and rarely more than two levels deep;
/// hitting this limit means a cycle slipped past validation.
pub const MAX_RESOLUTION_DEPTH: usize = 8;
