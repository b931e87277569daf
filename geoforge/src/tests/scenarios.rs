use std::cell::RefCell;
use std::rc::Rc;

use ahash::HashSet;
use approx::assert_abs_diff_eq;
use assert_matches::assert_matches;
use geo::Area;
use geoforge_types::convert::feature_to_geo;
use geoforge_types::GeometryKind;
use geojson::{Feature, FeatureCollection};
use tokio_test::block_on;

use super::{
    init_logger, multi_line_feature, point_feature, polygon_feature, unit_square, FailingEngine,
    RecordingRenderer,
};
use crate::config::{DistanceSpace, ProcessingConfig};
use crate::error::{GeoforgeError, ValidationError};
use crate::export::{parse_feature_collection, to_gpx};
use crate::filter::{filter_features, FilterCondition, FilterOperator};
use crate::layer::{collection, LayerId, LayerStore};
use crate::ops::{
    buffer_features, BufferParams, ClipParams, DifferenceParams, DissolveParams, ExtractParams,
    Geoprocessor, IntersectParams, OperationKind, OperationListener, OperationRequest,
    OperationState, OutputSpec, UnionParams, VoronoiParams,
};

fn config() -> ProcessingConfig {
    ProcessingConfig::default().with_distance_space(DistanceSpace::Planar)
}

fn setup() -> (Geoprocessor, LayerStore) {
    init_logger();
    (Geoprocessor::new(config()), LayerStore::headless(&config()))
}

fn add(store: &mut LayerStore, name: &str, features: Vec<Feature>) -> LayerId {
    store
        .add_upload(collection(features), name, None)
        .unwrap()
}

fn total_area(collection: &FeatureCollection) -> f64 {
    collection
        .features
        .iter()
        .map(|f| feature_to_geo(f).unwrap().unsigned_area())
        .sum()
}

#[test]
fn dissolve_then_zero_buffer() {
    let (processor, mut store) = setup();
    let squares = add(
        &mut store,
        "Squares",
        vec![polygon_feature(unit_square(0.0, 0.0)), polygon_feature(unit_square(1.0, 0.0))],
    );

    let report = block_on(processor.execute(
        &mut store,
        OperationRequest::Dissolve(DissolveParams {
            source: Some(squares),
            field: None,
            output: OutputSpec::new("Dissolved"),
            keep_inputs: true,
        }),
    ))
    .unwrap();

    let dissolved = store.get(report.created[0]).unwrap();
    assert_eq!(dissolved.data().features.len(), 1);
    assert_abs_diff_eq!(total_area(dissolved.data()), 2.0, epsilon = 1e-9);

    let source = store.get(squares).unwrap().data();
    let buffered = buffer_features(processor.engine(), source, 0.0, DistanceSpace::Planar).unwrap();
    assert_abs_diff_eq!(total_area(&collection(buffered)), 2.0, epsilon = 1e-9);

    let zero_request = OperationRequest::Buffer(BufferParams {
        source: Some(squares),
        distance: Some(0.0),
        output: OutputSpec::new("Buffer"),
    });
    assert_matches!(
        block_on(processor.execute(&mut store, zero_request)),
        Err(GeoforgeError::Validation(ValidationError::InvalidDistance))
    );
    assert_eq!(store.len(), 2);
}

#[test]
fn voronoi_needs_three_points() {
    let (processor, mut store) = setup();
    let two = add(&mut store, "Two", vec![point_feature(0.0, 0.0), point_feature(1.0, 1.0)]);
    let three = add(
        &mut store,
        "Three",
        vec![point_feature(0.0, 0.0), point_feature(4.0, 0.0), point_feature(2.0, 3.0)],
    );

    let request = |source| {
        OperationRequest::Voronoi(VoronoiParams {
            source: Some(source),
            output: OutputSpec::new("Cells"),
            keep_inputs: true,
        })
    };

    assert_matches!(
        block_on(processor.execute(&mut store, request(two))),
        Err(GeoforgeError::OperationFailed {
            operation: OperationKind::Voronoi,
            ..
        })
    );
    assert_eq!(store.len(), 2);

    let report = block_on(processor.execute(&mut store, request(three))).unwrap();
    assert_eq!(report.created.len(), 1);
    let cells = store.get(report.created[0]).unwrap();
    assert!(cells.geometry_type().is_polygonal());
    assert!(!cells.data().features.is_empty());
}

#[test]
fn clip_skips_inputs_without_surviving_features() {
    let (processor, mut store) = setup();
    let inside = add(&mut store, "Inside", vec![point_feature(0.5, 0.5)]);
    let outside = add(
        &mut store,
        "Outside",
        vec![multi_line_feature(vec![vec![(5.0, 5.0), (6.0, 6.0)], vec![(7.0, 5.0), (8.0, 6.0)]])],
    );
    let mask = add(&mut store, "Mask", vec![polygon_feature(unit_square(0.0, 0.0))]);

    let report = block_on(processor.execute(
        &mut store,
        OperationRequest::Clip(ClipParams {
            inputs: vec![inside, outside],
            mask: Some(mask),
            outputs: vec![],
            keep_inputs: false,
        }),
    ))
    .unwrap();

    assert_eq!(report.created.len(), 1);
    assert_eq!(report.removed, vec![inside]);
    assert_eq!(store.get(report.created[0]).unwrap().name(), "Inside (clipped)");
    assert!(store.get(outside).is_some());
    assert!(store.get(mask).is_some());
}

#[test]
fn clip_mask_must_be_polygonal() {
    let (processor, mut store) = setup();
    let input = add(&mut store, "Input", vec![point_feature(0.5, 0.5)]);
    let mask = add(&mut store, "Points", vec![point_feature(0.0, 0.0)]);

    assert_matches!(
        block_on(processor.execute(
            &mut store,
            OperationRequest::Clip(ClipParams {
                inputs: vec![input],
                mask: Some(mask),
                outputs: vec![],
                keep_inputs: true,
            }),
        )),
        Err(GeoforgeError::Validation(ValidationError::WrongGeometry { expected: "polygon", .. }))
    );
}

#[test]
fn dissolve_by_region() {
    let (processor, mut store) = setup();
    let mut features = vec![];
    for (x, y, region) in [(0.0, 0.0, "A"), (1.0, 0.0, "A"), (5.0, 5.0, "B"), (8.0, 8.0, "B")] {
        let mut feature = polygon_feature(unit_square(x, y));
        feature.set_property("region", region);
        features.push(feature);
    }
    let parcels = add(&mut store, "Parcels", features);

    let report = block_on(processor.execute(
        &mut store,
        OperationRequest::Dissolve(DissolveParams {
            source: Some(parcels),
            field: Some("region".into()),
            output: OutputSpec::new("Regions"),
            keep_inputs: false,
        }),
    ))
    .unwrap();

    assert_eq!(report.removed, vec![parcels]);
    let regions = store.get(report.created[0]).unwrap();
    let values: Vec<_> = regions
        .data()
        .features
        .iter()
        .map(|f| f.property("region").cloned())
        .collect();
    assert_eq!(values, vec![Some("A".into()), Some("B".into())]);
}

#[test]
fn union_replaces_inputs() {
    let (processor, mut store) = setup();
    let a = add(&mut store, "A", vec![polygon_feature(unit_square(0.0, 0.0))]);
    let b = add(&mut store, "B", vec![polygon_feature(unit_square(0.5, 0.0))]);

    let report = block_on(processor.execute(
        &mut store,
        OperationRequest::Union(UnionParams {
            layers: vec![a, b],
            output: OutputSpec::new("A"),
            keep_inputs: false,
        }),
    ))
    .unwrap();

    assert_eq!(report.removed, vec![a, b]);
    assert_eq!(store.len(), 1);
    let merged = store.get(report.created[0]).unwrap();
    // The name was taken when the output was added.
    assert_eq!(merged.name(), "A (1)");
    assert_abs_diff_eq!(total_area(merged.data()), 1.5, epsilon = 1e-9);
}

#[test]
fn failed_union_leaves_store_untouched() {
    let (processor, mut store) = setup();
    let a = add(&mut store, "A", vec![polygon_feature(unit_square(0.0, 0.0))]);
    let b = add(&mut store, "B", vec![point_feature(0.5, 0.5)]);

    let result = block_on(processor.execute(
        &mut store,
        OperationRequest::Union(UnionParams {
            layers: vec![a, b],
            output: OutputSpec::new("Union"),
            keep_inputs: false,
        }),
    ));

    assert_matches!(result, Err(GeoforgeError::OperationFailed { .. }));
    assert_eq!(store.len(), 2);
}

#[test]
fn union_with_failing_engine_falls_back() {
    init_logger();
    let processor = Geoprocessor::with_engine(FailingEngine::default().fail_union(), config());
    let mut store = LayerStore::headless(&config());
    let a = add(&mut store, "A", vec![polygon_feature(unit_square(0.0, 0.0))]);
    let b = add(&mut store, "B", vec![polygon_feature(unit_square(0.5, 0.0))]);

    let report = processor
        .execute_now(
            &mut store,
            OperationRequest::Union(UnionParams {
                layers: vec![a, b],
                output: OutputSpec::new("Union"),
                keep_inputs: true,
            }),
        )
        .unwrap();

    let merged = store.get(report.created[0]).unwrap();
    assert!(merged.geometry_type().is_polygonal());
    assert!(total_area(merged.data()) >= 1.0);
}

#[test]
fn empty_intersection_is_an_empty_layer() {
    let (processor, mut store) = setup();
    let a = add(&mut store, "A", vec![polygon_feature(unit_square(0.0, 0.0))]);
    let b = add(&mut store, "B", vec![polygon_feature(unit_square(3.0, 3.0))]);

    let report = block_on(processor.execute(
        &mut store,
        OperationRequest::Intersect(IntersectParams {
            first: Some(a),
            second: Some(b),
            output: OutputSpec::new("Overlap"),
        }),
    ))
    .unwrap();

    let overlap = store.get(report.created[0]).unwrap();
    assert!(overlap.data().features.is_empty());
    assert_eq!(overlap.geometry_type(), GeometryKind::Polygon);
}

#[test]
fn difference_of_pooled_layers() {
    let (processor, mut store) = setup();
    let base = add(
        &mut store,
        "Base",
        vec![polygon_feature(geo::Rect::new((0.0, 0.0), (3.0, 1.0)).to_polygon())],
    );
    let first = add(&mut store, "First", vec![polygon_feature(unit_square(0.0, 0.0))]);
    let second = add(&mut store, "Second", vec![polygon_feature(unit_square(2.0, 0.0))]);

    let report = block_on(processor.execute(
        &mut store,
        OperationRequest::Difference(DifferenceParams {
            base: Some(base),
            subtract: vec![first, second],
            output: OutputSpec::new("Rest"),
        }),
    ))
    .unwrap();

    let rest = store.get(report.created[0]).unwrap();
    assert_eq!(rest.data().features.len(), 1);
    assert_abs_diff_eq!(total_area(rest.data()), 1.0, epsilon = 1e-9);
    assert_eq!(store.len(), 4);
}

#[test]
fn filtered_rows_are_extracted() {
    let (processor, mut store) = setup();
    let mut features = vec![];
    for (index, depth) in [12, 40, 75].into_iter().enumerate() {
        let mut feature = point_feature(index as f64, 0.0);
        feature.set_property("depth", depth);
        features.push(feature);
    }
    let wells = add(&mut store, "Wells", features);

    let keys: HashSet<_> = filter_features(
        store.get(wells).unwrap().data(),
        &[FilterCondition::new("depth", FilterOperator::Ge, "40")],
    )
    .into_iter()
    .map(|(key, _)| key)
    .collect();

    let report = block_on(processor.execute(
        &mut store,
        OperationRequest::Extract(ExtractParams {
            source: Some(wells),
            keys,
            output: OutputSpec::new("Deep wells"),
            keep_inputs: true,
        }),
    ))
    .unwrap();

    let deep = store.get(report.created[0]).unwrap();
    assert_eq!(deep.data().features.len(), 2);
    assert_eq!(deep.geometry_type(), GeometryKind::Point);
}

#[test]
fn operations_wait_for_the_map() {
    init_logger();
    let renderer = RecordingRenderer::default();
    let mut store = LayerStore::new(renderer.clone(), &config());
    let processor = Geoprocessor::new(config());
    let points = add(&mut store, "Points", vec![point_feature(0.0, 0.0)]);

    renderer.set_ready(false);
    let result = block_on(processor.execute(
        &mut store,
        OperationRequest::Buffer(BufferParams {
            source: Some(points),
            distance: Some(1.0),
            output: OutputSpec::new("Buffer"),
        }),
    ));

    assert_matches!(result, Err(GeoforgeError::RendererNotReady));
    assert_eq!(store.len(), 1);
}

#[derive(Default, Clone)]
struct StateLog(Rc<RefCell<Vec<(OperationKind, OperationState)>>>);

impl OperationListener for StateLog {
    fn state_changed(&self, operation: OperationKind, state: &OperationState) {
        self.0.borrow_mut().push((operation, state.clone()));
    }
}

#[test]
fn listener_sees_processing_before_completion() {
    init_logger();
    let log = StateLog::default();
    let processor = Geoprocessor::new(config()).with_listener(log.clone());
    let mut store = LayerStore::headless(&config());
    let points = add(&mut store, "Points", vec![point_feature(0.0, 0.0)]);

    let report = block_on(processor.execute(
        &mut store,
        OperationRequest::Buffer(BufferParams {
            source: Some(points),
            distance: Some(1.0),
            output: OutputSpec::new("Buffer"),
        }),
    ))
    .unwrap();

    let _ = block_on(processor.execute(
        &mut store,
        OperationRequest::Buffer(BufferParams {
            source: None,
            distance: Some(1.0),
            output: OutputSpec::new("Buffer"),
        }),
    ));

    let states = log.0.borrow();
    assert_eq!(states.len(), 4);
    assert_eq!(states[0], (OperationKind::Buffer, OperationState::Processing));
    assert_eq!(states[1], (OperationKind::Buffer, OperationState::Completed(report)));
    assert_eq!(states[2], (OperationKind::Buffer, OperationState::Processing));
    assert_matches!(
        &states[3],
        (OperationKind::Buffer, OperationState::Failed(n)) if n.title == "Invalid input"
    );
}

#[test]
fn uploaded_layer_is_exported_to_gpx() {
    let (_, mut store) = setup();
    let data = parse_feature_collection(
        r#"{
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "properties": {"name": "Summit"},
                    "geometry": {"type": "Point", "coordinates": [7.65, 45.97]}
                },
                {
                    "type": "Feature",
                    "properties": {"name": "Trail"},
                    "geometry": {"type": "LineString", "coordinates": [[7.6, 45.9], [7.65, 45.97]]}
                }
            ]
        }"#,
    )
    .unwrap();

    let id = store.add_upload(data, "Hike", None).unwrap();
    let layer = store.get(id).unwrap();
    assert_eq!(layer.geometry_type(), GeometryKind::Point);

    let gpx = to_gpx(layer.data(), "geoforge").unwrap();
    assert!(gpx.contains("<name>Summit</name>"));
    assert!(gpx.contains("<name>Trail</name>"));
    assert!(gpx.contains("<trkseg>"));
}
