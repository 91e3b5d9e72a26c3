//! Veil Aspect Layer
//!
//! Composes multiple named cross-cutting behaviors into a single dispatch
//! pipeline over `veil-core` proxies:
//! - **Advice**: around / before / after-returning / after-throwing
//!   (`advice` module)
//! - **Advisors**: named advice with shared or per-instance scope and a
//!   pointcut (`advisor` module)
//! - **Pipeline**: ordered composition into a `DispatchHandler`
//!   (`pipeline` module)
//!
//! # Example
//!
//! ```rust,ignore
//! use veil_aop::{Advice, AdvicePipeline, Advisor, Pointcut};
//!
//! let pipeline = AdvicePipeline::compose(vec![
//!     Advisor::shared("audit", Advice::before(|inv| {
//!         println!("calling {}", inv.token());
//!         Ok(())
//!     }))
//!     .with_pointcut(Pointcut::name_prefix("get_")),
//! ]);
//!
//! let proxy = pipeline.instantiate(&factory, &[])?;
//! ```
//!
//! Shared-scoped advice may serve many proxy instances' dispatch paths
//! concurrently; advice holding mutable state must be internally
//! thread-safe — that is the advisor author's responsibility, not the
//! engine's.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod advice;
pub mod advisor;
pub mod pipeline;

pub use advice::{
    Advice, AfterReturningAdvice, AfterThrowingAdvice, AroundAdvice, BeforeAdvice,
};
pub use advisor::{AdviceScope, Advisor, Pointcut};
pub use pipeline::{AdvicePipeline, BoundPipeline};
