use paddi_core::domain::PaddiError;
use paddi_core::parameters::{HEADER_SKIP_LINES, Parameter, ParameterSet, default_format};
use paddi_core::schema::{Schema, Value};
use paddi_core::series::{
    BlockReaderConfig, BlockSeries, ScalarSeries, SpectralSeriesReader, default_diagnostic_format,
};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn run_parameters(x_extent: f64) -> ParameterSet {
    let entries = vec![
        ("B_therm", Value::Float(1.0)),
        ("B_comp", Value::Float(1.0)),
        ("D_visc", Value::Float(7.0)),
        ("D_therm", Value::Float(1.0)),
        ("D_comp", Value::Float(0.01)),
        ("S_therm", Value::Float(1.0)),
        ("S_comp", Value::Float(0.5)),
        ("Gammax", Value::Float(x_extent)),
        ("Gammay", Value::Float(50.0)),
        ("Gammaz", Value::Float(200.0)),
        ("cfl_safety_factor", Value::Float(0.4)),
        ("maximum_time_step_length", Value::Float(0.1)),
        ("initial_time_step_length", Value::Float(1.0e-4)),
        ("max_degree_of_x_fourier_modes", Value::Integer(32)),
        ("max_degree_of_y_fourier_modes", Value::Integer(16)),
        ("max_degree_of_z_fourier_modes", Value::Integer(64)),
        ("number_of_tasks_1st_transpose", Value::Integer(4)),
        ("number_of_tasks_2nd_transpose", Value::Integer(2)),
    ];
    ParameterSet::from_entries(&default_format(), entries).expect("parameters should build")
}

fn header(x_extent: f64) -> String {
    run_parameters(x_extent).to_header_string(HEADER_SKIP_LINES)
}

fn write_file(path: &Path, content: &str) -> PathBuf {
    fs::write(path, content).expect("fixture should be written");
    path.to_path_buf()
}

fn diagnostic_rows(steps: std::ops::Range<i64>) -> String {
    let mut text = String::new();
    for step in steps {
        text.push_str(&format!("{step} {:.4}", step as f64 * 0.01));
        for column in 0..33 {
            text.push_str(&format!(" {}.5", column));
        }
        text.push('\n');
    }
    text
}

#[test]
fn diagnostic_files_concatenate_in_order() {
    let temp = TempDir::new().expect("tempdir should be created");
    let first = write_file(
        &temp.path().join("OUT001"),
        &(header(100.0) + &diagnostic_rows(0..100)),
    );
    let second = write_file(
        &temp.path().join("OUT002"),
        &(header(120.0) + &diagnostic_rows(100..200)),
    );

    let series = ScalarSeries::load(&[&first, &second], &default_diagnostic_format())
        .expect("diagnostics should load");

    assert_eq!(series.len(), 200);
    let steps = series.steps().expect("istep column");
    assert!(steps.windows(2).all(|pair| pair[1] > pair[0]));
    assert_eq!(steps.first(), Some(&0));
    assert_eq!(steps.last(), Some(&199));

    let parameters = series.parameters().expect("parameters should come from OUT001");
    assert_eq!(
        parameters.float(Parameter::XExtent).expect("x extent"),
        100.0
    );
    assert_eq!(
        series.column_f64("diss_Chem").expect("last column")[0],
        32.5
    );
}

#[test]
fn header_round_trips_through_text() {
    let temp = TempDir::new().expect("tempdir should be created");
    let original = run_parameters(100.0);
    let path = write_file(
        &temp.path().join("OUT001"),
        &original.to_header_string(HEADER_SKIP_LINES),
    );

    let reread = ParameterSet::from_header(&path, HEADER_SKIP_LINES, &default_format())
        .expect("rendered header should parse");
    for name in default_format().names() {
        assert_eq!(
            reread.get(name).expect("value should be present"),
            original.get(name).expect("value should be present"),
            "{name} should survive the round trip"
        );
    }
}

#[test]
fn profile_with_header_reads_every_block() {
    let temp = TempDir::new().expect("tempdir should be created");
    let config = BlockReaderConfig::default().with_format(Schema::floats(&["z1", "Temp"]));
    let mut text = header(100.0);
    text.push('\n');
    text.push_str("#Step=100,Time=0.5\n2.0 0.2\n0.0 0.0\n1.0 0.1\n\n");
    text.push_str("#Step=200,Time=1.0\n1.0 1.1\n2.0 1.2\n0.0 1.0\n");
    let path = write_file(&temp.path().join("ZPROF001"), &text);

    let series = BlockSeries::load(&[&path], &config).expect("profile should load");
    assert_eq!(series.len(), 2);
    assert_eq!(series.shape(), &[3]);
    assert_eq!(series.steps(), &[100, 200]);
    assert_eq!(series.times(), &[0.5, 1.0]);
    let field = series.field("Temp").expect("Temp field");
    assert_eq!(field.shape(), &[2, 3]);
    assert_eq!(field[[1, 2]], 1.2);
    assert!(series.parameters().is_some());
}

#[test]
fn blocks_from_two_files_stack_in_file_order() {
    let temp = TempDir::new().expect("tempdir should be created");
    let config = BlockReaderConfig::default()
        .with_format(Schema::floats(&["z1", "Temp"]))
        .with_header(None);
    let first = write_file(
        &temp.path().join("ZPROF001"),
        "#Step=1,Time=0.1\n0.0 1.0\n1.0 1.0\n",
    );
    let second = write_file(
        &temp.path().join("ZPROF002"),
        "\n#Step=2,Time=0.2\n0.0 2.0\n1.0 2.0\n\n\n",
    );

    let series = BlockSeries::load(&[&first, &second], &config).expect("profiles should load");
    assert_eq!(series.len(), 2);
    assert_eq!(series.steps(), &[1, 2]);
    assert_eq!(
        series
            .snapshot("Temp", 1)
            .expect("second snapshot")
            .iter()
            .copied()
            .collect::<Vec<_>>(),
        vec![2.0, 2.0]
    );
}

#[test]
fn comment_without_time_fails_whole_load() {
    let temp = TempDir::new().expect("tempdir should be created");
    let config = BlockReaderConfig::default()
        .with_format(Schema::floats(&["z1", "Temp"]))
        .with_header(None);
    let path = write_file(
        &temp.path().join("ZPROF001"),
        "#Step=10,Time=0.5\n0.0 1.0\n1.0 1.0\n\n#Step=50\n0.0 2.0\n1.0 2.0\n",
    );

    let error = BlockSeries::load(&[&path], &config).expect_err("comment should be rejected");
    assert!(matches!(error, PaddiError::Format { line: 5, .. }));
}

#[test]
fn ragged_block_is_a_format_error() {
    let temp = TempDir::new().expect("tempdir should be created");
    let config = BlockReaderConfig::default()
        .with_format(Schema::floats(&["x", "z", "Temp"]))
        .with_sort_keys(["x", "z"])
        .with_header(None);
    let path = write_file(
        &temp.path().join("ZPROF001"),
        "#Step=1,Time=0.1\n0 0 1\n1 0 1\n0 1 1\n1 1 1\n2 1 1\n",
    );

    let error = BlockSeries::load(&[&path], &config).expect_err("ragged block should fail");
    assert!(matches!(error, PaddiError::Format { .. }));
}

#[test]
fn two_keys_infer_a_two_dimensional_grid() {
    let temp = TempDir::new().expect("tempdir should be created");
    let mut text = String::from("#Timstep=3 time=0.75\n");
    for k1 in 0..3 {
        for k0 in 0..4 {
            text.push_str(&format!("{k0} {k1} {}\n", k0 * 10 + k1));
        }
    }
    let path = write_file(&temp.path().join("XY_SPEC001"), &text);

    let series = SpectralSeriesReader::horizontal()
        .with_format(Schema::floats(&["energy_u"]))
        .with_header(None)
        .load(&[&path])
        .expect("spectrum should load");

    assert_eq!(series.shape(), &[3, 4]);
    let energy = series.field("energy_u").expect("energy field");
    assert_eq!(energy.shape(), &[1, 3, 4]);
    assert_eq!(energy[[0, 2, 3]], 32.0);
    let k0 = series.field("k0").expect("k0 field");
    assert_eq!(k0[[0, 1, 3]], 3.0);
}
