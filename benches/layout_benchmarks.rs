//! Benchmarks for struct layout, name resolution and the compile pipeline.
//!
//! Run with the `profile-with-puffin` feature to collect scope timings of
//! the instrumented hot paths:
//!
//! ```bash
//! cargo bench --features profile-with-puffin
//! ```

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use snex::prelude::*;
use std::hint::black_box;
use std::sync::Arc;

#[cfg(feature = "profile-with-puffin")]
static FRAME_VIEW: std::sync::OnceLock<puffin::GlobalFrameView> = std::sync::OnceLock::new();

#[cfg(feature = "profile-with-puffin")]
fn setup_profiler() {
    puffin::set_scopes_on(true);
    FRAME_VIEW.get_or_init(puffin::GlobalFrameView::default);
}

#[cfg(not(feature = "profile-with-puffin"))]
fn setup_profiler() {}

#[cfg(feature = "profile-with-puffin")]
fn end_profiling_frame() {
    puffin::GlobalProfiler::lock().new_frame();
}

#[cfg(not(feature = "profile-with-puffin"))]
fn end_profiling_frame() {}

fn wide_struct(members: usize) -> StructType {
    let types = [TypeId::Integer, TypeId::Double, TypeId::Float];
    (0..members).fold(StructType::new(NamespacedIdentifier::new("Wide")), |s, i| {
        s.with_member(format!("m{i}").as_str(), TypeInfo::new(types[i % types.len()]))
    })
}

/// `depth` nested namespaces, each declaring a constant and a struct.
fn nested_source(depth: usize) -> String {
    let mut source = String::new();
    for i in 0..depth {
        source.push_str(&format!(
            "namespace N{i} {{\n static const int size{i} = {};\n struct S{i} {{ int a; double b; span<float, size{i}> c; }};\n S{i} value{i};\n",
            i + 1
        ));
    }
    source.push_str(&"}\n".repeat(depth));
    source
}

fn bench_struct_layout(c: &mut Criterion) {
    setup_profiler();
    let mut group = c.benchmark_group("layout");

    for members in [4, 32, 256] {
        group.throughput(Throughput::Elements(members as u64));
        group.bench_with_input(BenchmarkId::new("finalise", members), &members, |b, &n| {
            b.iter(|| {
                let ty: ComplexType = wide_struct(n).into();
                ty.finalise_alignment().unwrap();
                end_profiling_frame();
                black_box(ty.required_byte_size())
            })
        });
    }

    let element: ComplexTypePtr = {
        let ty: ComplexType = wide_struct(8).into();
        ty.finalise_alignment().unwrap();
        Arc::new(ty)
    };
    group.bench_function("initialise_span_of_structs", |b| {
        let span: ComplexType = SpanType::new(TypeInfo::from_complex(element.clone()), 64).into();
        span.finalise_alignment().unwrap();
        let list = span.make_default_initialiser_list();
        let mut data = vec![0u8; span.required_byte_size()];
        b.iter(|| {
            span.initialise(&mut data, &list).unwrap();
            end_profiling_frame();
            black_box(data[0])
        })
    });

    group.finish();
}

fn bench_resolution(c: &mut Criterion) {
    setup_profiler();
    let mut handler = NamespaceHandler::new();
    let mut path = NamespacedIdentifier::root();
    for i in 0..16 {
        path = path.get_child_id(format!("N{i}").as_str());
        handler
            .add_constant(path.get_child_id("limit"), VariableStorage::Integer(i))
            .unwrap();
    }

    let mut guard = handler.scoped_namespace(&path);
    guard.push_namespace("Leaf");
    let target = NamespacedIdentifier::new("limit");
    c.bench_function("resolve_from_depth_16", |b| {
        b.iter(|| {
            let found = guard.resolve_checked(black_box(&target));
            end_profiling_frame();
            black_box(found)
        })
    });
}

fn bench_compile(c: &mut Criterion) {
    setup_profiler();
    let mut group = c.benchmark_group("compile");

    for depth in [1, 8, 32] {
        let source = nested_source(depth);
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_with_input(BenchmarkId::new("nested", depth), &source, |b, source| {
            b.iter(|| {
                let mut global = GlobalScope::new();
                let object = Compiler::new(&global).compile(&mut global, source).unwrap();
                end_profiling_frame();
                black_box(object)
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_struct_layout, bench_resolution, bench_compile);
criterion_main!(benches);
