//! Common utilities for benchmarks

use criterion::Criterion;
use pea_core::types::{Package, PackageGraph, ProductRef, Target};
use pprof::criterion::{Output, PProfProfiler};
use std::fmt::Write;

/// Configure criterion with flamegraph profiling support
pub fn criterion_config() -> Criterion {
    Criterion::default()
        .warm_up_time(std::time::Duration::from_secs(3))
        .measurement_time(std::time::Duration::from_secs(10))
        .sample_size(100)
        .with_profiler(PProfProfiler::new(100, Output::Flamegraph(None)))
}

/// `p0 -> p1 -> ... -> p{depth}`, each package renaming the next one's module
pub fn chain_graph(depth: usize) -> PackageGraph {
    let mut graph = PackageGraph::new();
    for i in 0..=depth {
        let mut target = Target::new(format!("T{i}")).with_sources([format!("src/t{i}.ts")].into_iter().collect());
        if i < depth {
            let next = i + 1;
            target = target.with_product_dependency(
                ProductRef::new(format!("p{next}").as_str(), format!("P{next}")).with_alias(format!("T{next}"), format!("Alias{next}")),
            );
        }
        let package = Package::new(format!("p{i}").as_str())
            .with_target(target)
            .with_product(format!("P{i}"), &[format!("T{i}").as_str()]);
        // Names are unique, insertion cannot fail
        let _ = graph.add_package(package);
    }
    graph
}

/// An app depending on `width` sibling products that all carry a `Shared`
/// target; every other sibling requests a conflicting alias for it
pub fn sibling_graph(width: usize) -> PackageGraph {
    let mut graph = PackageGraph::new();
    let mut app = Target::new("App");
    for i in 0..width {
        let alias = if i % 2 == 0 { "Even" } else { "Odd" };
        app = app.with_product_dependency(ProductRef::new(format!("s{i}").as_str(), format!("S{i}")).with_alias("Shared", alias));

        let sibling = Package::new(format!("s{i}").as_str())
            .with_target(Target::new("Shared"))
            .with_target(Target::new(format!("S{i}")).with_target_dependency("Shared"))
            .with_product(format!("S{i}"), &[format!("S{i}").as_str()]);
        let _ = graph.add_package(sibling);
    }
    let _ = graph.add_package(Package::new("app").with_target(app).with_product("App", &["App"]));
    graph
}

/// Snapshot document equivalent to [`chain_graph`]
pub fn chain_snapshot(depth: usize) -> String {
    let mut snapshot = String::new();
    for i in 0..=depth {
        let _ = writeln!(snapshot, "[[package]]\nname = \"p{i}\"\n");
        let _ = writeln!(snapshot, "[[package.target]]\nname = \"T{i}\"\nsources = [\"src/t{i}.ts\"]");
        if i < depth {
            let next = i + 1;
            let _ = writeln!(
                snapshot,
                "dependencies = [{{ product = \"P{next}\", package = \"p{next}\", module-aliases = {{ T{next} = \"Alias{next}\" }} }}]"
            );
        }
        let _ = writeln!(snapshot, "\n[[package.product]]\nname = \"P{i}\"\ntargets = [\"T{i}\"]\n");
    }
    snapshot
}
