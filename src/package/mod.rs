//! Packages: specifiers, resolution and launch requests.

mod invocation;
mod resolver;
mod rez;
mod spec;

pub use invocation::{AliasTable, InvocationRequest};
pub use resolver::{InvocationOptions, LaunchMode, PackageResolver, ResolvedInvocation};
pub use rez::{PackageRuntime, RezRuntime};
pub use spec::PackageSpec;

#[cfg(test)]
pub use rez::MockPackageRuntime;
