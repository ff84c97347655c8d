//! Unit tests for oceandap modules
//!
//! These cover the DDS grammar, query building, depth alignment state handling,
//! geo helpers and error reporting without touching the network or disk.

use ndarray::{Array2, Array3, ArrayD, Axis, IxDyn};
use oceandap::{
    adjust_with_vmin, apply_margin, check_alignment, fetch_url, find_dimension, index_range,
    parse_dds, parse_declarations, query_string, reproject, reproject_all, retrieve_dds_info,
    AlignMode, AlignmentOutcome, AlignmentState, AttributeTable, BoundingBox, Crs, DataCatalog,
    DatasetAttributes, DdsError, DimensionDeclaration, DimensionSizes, MarginBound, MemorySource,
    OceanDapError, PlatformDataset, Variable,
};

const SAMPLE_DDS: &str = r#"Dataset {
    Float64 TIME[TIME = 8760];
    Float32 LATITUDE[LATITUDE = 1];
    Float32 LONGITUDE[LONGITUDE = 1];
    Float32 DEPTH[DEPTH = 20];
    Grid {
     ARRAY:
        Float32 TEMP[TIME = 8760][DEPTH = 20];
     MAPS:
        Float64 TIME[TIME = 8760];
        Float32 DEPTH[DEPTH = 20];
    } TEMP;
    Byte TEMP_QC[TIME = 8760][DEPTH = 20];
} IR_TS_MO_6100284_2018.nc;
"#;

fn attributes(code: &str, vertical_min: f64) -> DatasetAttributes {
    DatasetAttributes {
        platform_code: code.to_string(),
        platform_name: format!("{code} buoy"),
        year: 2018,
        data_type: "OceanSITES time-series data".to_string(),
        title: "Mooring time series".to_string(),
        instrument: "CTD".to_string(),
        vertical_min,
        vertical_max: 19.0,
        lon_min: 2.5,
        lon_max: 2.5,
        lat_min: 41.3,
        lat_max: 41.3,
    }
}

/// TEMP(TIME=2, DEPTH=4) with values 1..=8
fn catalog_with(code: &str, vertical_min: f64) -> DataCatalog {
    let data = Array2::from_shape_vec((2, 4), (1..=8).map(|v| v as f32).collect())
        .unwrap()
        .into_dyn();
    let mut dataset = PlatformDataset::new(code, attributes(code, vertical_min));
    dataset.insert_variable(
        Variable::new("TEMP", vec!["TIME".into(), "DEPTH".into()], data).unwrap(),
    );
    let mut catalog = DataCatalog::new();
    catalog.insert(dataset);
    catalog
}

fn temp(catalog: &DataCatalog, code: &str) -> ArrayD<f32> {
    catalog.get(code).unwrap().variable("TEMP").unwrap().data.clone()
}

#[test]
fn test_parse_dds_returns_last_index() {
    let sizes = parse_dds(SAMPLE_DDS).unwrap();
    assert_eq!(sizes.get("TIME"), Some(8759));
    assert_eq!(sizes.get("LATITUDE"), Some(0));
    assert_eq!(sizes.get("LONGITUDE"), Some(0));
    assert_eq!(sizes.get("DEPTH"), Some(19));

    let order: Vec<&str> = sizes.iter().map(|(name, _)| name).collect();
    assert_eq!(order, vec!["TIME", "LATITUDE", "LONGITUDE", "DEPTH"]);
}

#[test]
fn test_declarations_are_unique_and_ordered() {
    let decls = parse_declarations(SAMPLE_DDS);
    assert_eq!(
        decls,
        vec![
            DimensionDeclaration { name: "TIME".into(), size: 8760 },
            DimensionDeclaration { name: "LATITUDE".into(), size: 1 },
            DimensionDeclaration { name: "LONGITUDE".into(), size: 1 },
            DimensionDeclaration { name: "DEPTH".into(), size: 20 },
        ]
    );
}

#[test]
fn test_declaration_grammar_ignores_other_brackets() {
    let text = "TEMP[0:1:5] [ TIME=3 ] [note] [DEPTH = x] [LAT.bnds = 2]";
    let decls = parse_declarations(text);
    assert_eq!(
        decls,
        vec![
            DimensionDeclaration { name: "TIME".into(), size: 3 },
            DimensionDeclaration { name: "LAT.bnds".into(), size: 2 },
        ]
    );
}

#[test]
fn test_dimension_names_match_exactly() {
    // TIME_QC must not be mistaken for TIME
    let decls = parse_declarations("[TIME = 10] [TIME_QC = 10] [DEPTH_ADJUSTED = 4]");
    assert_eq!(find_dimension(&decls, "TIME").unwrap(), 9);
    assert!(find_dimension(&decls, "DEPTH").is_err());
}

#[test]
fn test_missing_dimension_fails() {
    let text = "[TIME = 10] [LATITUDE = 1] [LONGITUDE = 1]";
    match parse_dds(text) {
        Err(OceanDapError::Dds(DdsError::DimensionNotFound(name))) => assert_eq!(name, "DEPTH"),
        other => panic!("Expected DimensionNotFound, got {other:?}"),
    }
}

#[test]
fn test_ambiguous_dimension_fails() {
    let text = "[TIME = 10] [TIME = 12] [LATITUDE = 1] [LONGITUDE = 1] [DEPTH = 3]";
    match parse_dds(text) {
        Err(OceanDapError::Dds(DdsError::AmbiguousDimension { name, count })) => {
            assert_eq!(name, "TIME");
            assert_eq!(count, 2);
        }
        other => panic!("Expected AmbiguousDimension, got {other:?}"),
    }
}

#[test]
fn test_empty_dimension_fails() {
    let text = "[TIME = 0] [LATITUDE = 1] [LONGITUDE = 1] [DEPTH = 3]";
    assert!(matches!(
        parse_dds(text),
        Err(OceanDapError::Dds(DdsError::EmptyDimension(_)))
    ));
}

#[test]
fn test_retrieve_dds_info_from_memory_source() {
    let mut source = MemorySource::new();
    source.insert("https://example.org/mooring.nc.dds", SAMPLE_DDS);

    let sizes = tokio_test::block_on(retrieve_dds_info(
        &source,
        "https://example.org/mooring.nc.dds",
    ))
    .unwrap();
    assert_eq!(sizes.get("DEPTH"), Some(19));

    let missing = tokio_test::block_on(retrieve_dds_info(&source, "https://example.org/other"));
    assert!(missing.is_err());
}

#[tokio::test]
async fn test_retrieve_dds_info_propagates_parse_errors() {
    let mut source = MemorySource::new();
    source.insert("bad", "Dataset { Float64 TIME[TIME = 5]; } broken;");
    let result = retrieve_dds_info(&source, "bad").await;
    assert!(matches!(result, Err(OceanDapError::Dds(_))));
}

#[test]
fn test_query_string() {
    let sizes: DimensionSizes = [("TIME", 5), ("DEPTH", 3)].into_iter().collect();
    assert_eq!(
        query_string(&sizes, &["TIME", "DEPTH"]),
        "TIME[0:1:5],DEPTH[0:1:3]"
    );
    // mapping order wins over request order
    assert_eq!(
        query_string(&sizes, &["DEPTH", "TIME"]),
        "TIME[0:1:5],DEPTH[0:1:3]"
    );
    assert_eq!(query_string(&sizes, &["DEPTH"]), "DEPTH[0:1:3]");
    assert_eq!(query_string(&sizes, &["LATITUDE"]), "");
}

#[test]
fn test_index_range_and_fetch_url() {
    assert_eq!(index_range(2, 7), "[2:1:7]");

    let sizes: DimensionSizes = [("TIME", 5), ("DEPTH", 3)].into_iter().collect();
    let no_vars: [&str; 0] = [];
    assert_eq!(
        fetch_url("https://example.org/a.nc", &no_vars, &sizes, &["TIME", "DEPTH"]),
        "https://example.org/a.nc?TIME[0:1:5],DEPTH[0:1:3]"
    );
    assert_eq!(
        fetch_url("https://example.org/a.nc", &["TEMP", "PSAL"], &sizes, &["TIME", "DEPTH"]),
        "https://example.org/a.nc?TEMP[0:1:5][0:1:3],PSAL[0:1:5][0:1:3]"
    );
    assert_eq!(
        fetch_url("https://example.org/a.nc", &no_vars, &sizes, &no_vars),
        "https://example.org/a.nc"
    );
}

#[test]
fn test_dimension_sizes_insert_keeps_position() {
    let mut sizes = DimensionSizes::new();
    sizes.insert("TIME", 1);
    sizes.insert("DEPTH", 2);
    sizes.insert("TIME", 9);
    assert_eq!(sizes.len(), 2);
    assert_eq!(sizes.to_string(), "TIME=9, DEPTH=2");
}

#[test]
fn test_adjust_with_vmin_shifts_along_axis() {
    let array = Array2::from_shape_vec((2, 3), vec![1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0])
        .unwrap()
        .into_dyn();
    let shifted = adjust_with_vmin(&array, 1, -1.0).unwrap();
    assert_eq!(shifted.shape(), &[2, 3]);
    assert_eq!(
        shifted.iter().copied().collect::<Vec<_>>(),
        vec![-1.0, 1.0, 2.0, -1.0, 4.0, 5.0]
    );

    let cube = Array3::<f32>::ones((2, 2, 3)).into_dyn();
    let shifted = adjust_with_vmin(&cube, 2, 0.0).unwrap();
    assert_eq!(shifted.shape(), &[2, 2, 3]);
    assert!(shifted.index_axis(Axis(2), 0).iter().all(|v| *v == 0.0));

    assert!(adjust_with_vmin(&cube, 3, 0.0).is_err());

    let empty = ArrayD::<f32>::zeros(IxDyn(&[2, 0]));
    assert_eq!(adjust_with_vmin(&empty, 1, 0.0).unwrap().shape(), &[2, 0]);
}

#[test]
fn test_alignment_shifts_exactly_once() {
    let mut catalog = catalog_with("61198", 1.0);
    let mut state = AlignmentState::for_catalog(&catalog);
    assert!(!state.is_aligned("61198", "TEMP"));

    let first = 
        check_alignment(&mut catalog, "61198", "TEMP", AlignMode::Align, &mut state)
            .unwrap();
    assert_eq!(first, AlignmentOutcome::Shifted);
    assert!(state.is_aligned("61198", "TEMP"));

    let once = temp(&catalog, "61198");
    assert_eq!(once.shape(), &[2, 4]);
    assert!(once[[0, 0]].is_nan());
    assert!(once[[1, 0]].is_nan());
    assert_eq!(once[[0, 1]], 1.0);
    assert_eq!(once[[0, 3]], 3.0);
    assert_eq!(once[[1, 1]], 5.0);

    let second = 
        check_alignment(&mut catalog, "61198", "TEMP", AlignMode::Align, &mut state)
            .unwrap();
    assert_eq!(second, AlignmentOutcome::AlreadyAligned);
    let twice = temp(&catalog, "61198");
    assert_eq!(twice[[0, 1]], 1.0);
    assert_eq!(twice[[1, 3]], 7.0);
}

#[test]
fn test_alignment_with_vmin_zero_never_mutates() {
    let mut catalog = catalog_with("6100284", 0.0);
    let before = temp(&catalog, "6100284");
    let mut state = AlignmentState::new();

    for mode in [AlignMode::Align, AlignMode::AlreadyAlignedUpstream, AlignMode::Align] {
        let outcome = check_alignment(&mut catalog, "6100284", "TEMP", mode, &mut state).unwrap();
        assert_eq!(outcome, AlignmentOutcome::Canonical);
    }
    assert_eq!(temp(&catalog, "6100284"), before);
    assert!(!state.is_aligned("6100284", "TEMP"));
}

#[test]
fn test_alignment_upstream_only_marks() {
    let mut catalog = catalog_with("61198", 1.0);
    let before = temp(&catalog, "61198");
    let mut state = AlignmentState::new();

    let outcome = check_alignment(
        &mut catalog,
        "61198",
        "TEMP",
        AlignMode::AlreadyAlignedUpstream,
        &mut state,
    )
    .unwrap();
    assert_eq!(outcome, AlignmentOutcome::MarkedUpstream);
    assert!(state.is_aligned("61198", "TEMP"));
    assert_eq!(temp(&catalog, "61198"), before);

    // a later request to align must not shift marked data
    let outcome = 
        check_alignment(&mut catalog, "61198", "TEMP", AlignMode::Align, &mut state)
            .unwrap();
    assert_eq!(outcome, AlignmentOutcome::AlreadyAligned);
    assert_eq!(temp(&catalog, "61198"), before);
}

#[test]
fn test_alignment_unrecognized_vmin_is_reported() {
    let mut catalog = catalog_with("buoy", 2.0);
    let before = temp(&catalog, "buoy");
    let mut state = AlignmentState::new();

    let outcome = 
        check_alignment(&mut catalog, "buoy", "TEMP", AlignMode::Align, &mut state)
            .unwrap();
    assert_eq!(outcome, AlignmentOutcome::UnrecognizedVerticalMin(2.0));
    assert_eq!(temp(&catalog, "buoy"), before);
    assert!(!state.is_aligned("buoy", "TEMP"));
}

#[test]
fn test_alignment_errors() {
    let mut catalog = catalog_with("61198", 1.0);
    let mut state = AlignmentState::new();

    let result = check_alignment(&mut catalog, "nope", "TEMP", AlignMode::Align, &mut state);
    assert!(matches!(result, Err(OceanDapError::PlatformNotFound { .. })));

    let result = check_alignment(&mut catalog, "61198", "PSAL", AlignMode::Align, &mut state);
    assert!(matches!(result, Err(OceanDapError::VariableNotFound { .. })));

    // variable without a DEPTH axis
    let series = ArrayD::<f32>::zeros(IxDyn(&[3]));
    catalog
        .get_mut("61198")
        .unwrap()
        .insert_variable(Variable::new("ATMS", vec!["TIME".into()], series).unwrap());
    let result = check_alignment(&mut catalog, "61198", "ATMS", AlignMode::Align, &mut state);
    assert!(matches!(result, Err(OceanDapError::DimensionNotFound { .. })));
    assert!(!state.is_aligned("61198", "ATMS"));
}

#[test]
fn test_alignment_state_json_round_trip() {
    let mut state = AlignmentState::new();
    state.mark_aligned("61198", "TEMP");
    let json = state.to_json().unwrap();
    assert!(json.contains("\"61198\""));

    let restored = AlignmentState::from_json(&json).unwrap();
    assert!(restored.is_aligned("61198", "TEMP"));
    assert!(!restored.is_aligned("61198", "PSAL"));
}

#[test]
fn test_apply_margin() {
    assert_eq!(apply_margin(100.0, "low"), Some(80.0));
    assert_eq!(apply_margin(100.0, "high"), Some(120.0));
    assert_eq!(apply_margin(100.0, "middle"), None);
    assert_eq!(apply_margin(100.0, "LOW"), None);
    assert_eq!(MarginBound::Low.apply(-10.0), -8.0);
}

#[test]
fn test_bounding_box_margin() {
    let bbox = BoundingBox::new(10.0, 20.0, 40.0, 50.0).with_margin();
    assert_eq!(bbox, BoundingBox::new(8.0, 24.0, 32.0, 60.0));
    assert!(bbox.contains(9.0, 55.0));
    assert!(!bbox.contains(25.0, 55.0));
}

#[test]
fn test_reproject_projected_input_is_northing_then_easting() {
    // a point on the equator 10 degrees east
    let (lon, lat) = reproject(Crs::Epsg3857, Crs::Epsg4326, 0.0, 1_113_194.907_932_7).unwrap();
    assert!((lon - 10.0).abs() < 1e-9);
    assert!(lat.abs() < 1e-9);

    let (lon, _) = reproject(Crs::Epsg3857, Crs::Epsg4326, 1_113_194.907_932_7, 0.0).unwrap();
    assert!(lon.abs() < 1e-9);
}

#[test]
fn test_reproject_round_trip() {
    let (x, y) = reproject(Crs::Epsg4326, Crs::Epsg3857, 0.0, 0.0).unwrap();
    assert!(x.abs() < 1e-6 && y.abs() < 1e-6);

    let (x, y) = reproject(Crs::Epsg4326, Crs::Epsg3857, 45.0, 10.0).unwrap();
    assert!((x - 1_113_194.907_932_7).abs() < 1e-3);
    assert!((y - 5_621_521.486_192_1).abs() < 1e-3);

    let (lon, lat) = reproject(Crs::Epsg3857, Crs::Epsg4326, y, x).unwrap();
    assert!((lon - 10.0).abs() < 1e-9);
    assert!((lat - 45.0).abs() < 1e-9);

    assert_eq!(
        reproject(Crs::Epsg4326, Crs::Epsg4326, 45.0, 10.0).unwrap(),
        (10.0, 45.0)
    );
    assert!(matches!(
        reproject(Crs::Epsg4326, Crs::Epsg3857, 89.0, 0.0),
        Err(OceanDapError::Projection(_))
    ));

    let (xs, ys) = reproject_all(Crs::Epsg4326, Crs::Epsg4326, &[1.0, 2.0], &[3.0, 4.0]).unwrap();
    assert_eq!((xs, ys), (vec![3.0, 4.0], vec![1.0, 2.0]));
    assert!(reproject_all(Crs::Epsg4326, Crs::Epsg3857, &[1.0], &[]).is_err());
}

#[test]
fn test_crs_parsing() {
    assert_eq!("EPSG:4326".parse::<Crs>().unwrap(), Crs::Epsg4326);
    assert_eq!("epsg:3857".parse::<Crs>().unwrap(), Crs::Epsg3857);
    assert_eq!("CRS:84".parse::<Crs>().unwrap(), Crs::Epsg4326);
    assert_eq!(Crs::Epsg3857.to_string(), "EPSG:3857");
    assert!(matches!("EPSG:32633".parse::<Crs>(), Err(OceanDapError::InvalidCrs(_))));
}

#[test]
fn test_attribute_record_round_trip() {
    let attrs = attributes("61198", 1.0);
    let record = attrs.to_record();
    assert_eq!(record.len(), 12);
    assert_eq!(record[0], "61198");
    assert_eq!(record[2], "2018");
    assert_eq!(record[6], "1");
    assert_eq!(DatasetAttributes::from_record(&record).unwrap(), attrs);

    let mut broken = record.clone();
    broken[6] = "one".to_string();
    assert!(matches!(
        DatasetAttributes::from_record(&broken),
        Err(OceanDapError::InvalidAttribute { .. })
    ));
    assert!(DatasetAttributes::from_record(&record[..5]).is_err());
}

#[test]
fn test_attribute_table() {
    let mut catalog = catalog_with("61198", 1.0);
    for (_, dataset) in catalog_with("6100284", 0.0).iter() {
        catalog.insert(dataset.clone());
    }

    let table = AttributeTable::from_catalog(&catalog);
    assert_eq!(table.len(), 2);
    assert_eq!(table.get("6100284").unwrap().vertical_min, 0.0);
    table.print();

    let json = table.to_json().unwrap();
    assert!(json.contains("\"platform\": \"61198\""));
    assert_eq!(AttributeTable::from_json(&json).unwrap(), table);
}

#[test]
fn test_error_display() {
    let err = OceanDapError::VariableNotFound { var: "TEMP".to_string() };
    assert!(err.to_string().contains("Variable 'TEMP' not found"));

    let err = OceanDapError::DimensionNotFound {
        var: "TEMP".to_string(),
        dim: "DEPTH".to_string(),
    };
    assert_eq!(err.to_string(), "Dimension 'DEPTH' not found in variable 'TEMP'");

    let err: OceanDapError = DdsError::DimensionNotFound("DEPTH".into()).into();
    assert!(err.to_string().starts_with("DDS error"));

    let err = OceanDapError::from("plain message");
    assert_eq!(err.to_string(), "plain message");
}

#[test]
fn test_variable_label_count_checked() {
    let data = ArrayD::<f32>::zeros(IxDyn(&[2, 3]));
    assert!(Variable::new("TEMP", vec!["TIME".into()], data).is_err());
}
