//! # Debt Growth Workspace
//!
//! Umbrella crate over the workspace members:
//!
//! - [`debt_growth`]: indicator acquisition, the Laffer curve and ARIMAX
//!   models, debt-service scenarios and charts
//! - [`growth_math`]: descriptive statistics and growth arithmetic
//!
//! ## Example
//!
//! ```
//! use debt_growth_workspace::growth_math::cumulative_growth_index;
//!
//! let index = cumulative_growth_index(&[10.0, 10.0]);
//! assert!((index[1] - 1.21).abs() < 1e-12);
//! ```

pub use debt_growth;
pub use growth_math;

/// Name and version of every workspace member
pub fn members() -> Vec<(&'static str, &'static str)> {
    vec![
        (debt_growth::NAME, debt_growth::VERSION),
        (growth_math::NAME, growth_math::VERSION),
    ]
}
