//! End-to-end lifecycle tests against real directories: read, write,
//! round-trip equality, portability, discovery, and attached updates.

use std::fs;
use std::path::{Path, PathBuf};

use jules_kit::config::Error;
use jules_kit::io;
use jules_kit::{
    AsciiData, Configuration, Dataset, ParameterSet, Patch, ReadOptions, Variable,
};

/// Writes a complete namelist set under `namelists_dir`, referencing one
/// ascii file, one nested ascii file, and one dataset, all relative.
fn write_fixture(root: &Path, namelists_subdir: &str) {
    let namelists_dir = root.join(namelists_subdir);
    fs::create_dir_all(&namelists_dir).unwrap();

    let filled: &[(&str, &str)] = &[
        (
            "ancillaries",
            "&jules_frac\n  file = 'frac.dat'\n  frac_name = 'frac'\n/\n",
        ),
        (
            "drive",
            "&jules_drive\n  file = 'driving/met.txt'\n  nvars = 5\n  tstep = 1800.0\n/\n",
        ),
        (
            "initial_conditions",
            "&jules_initial\n  file = 'initial.nc'\n  const_z = .true.\n/\n",
        ),
        (
            "output",
            "&jules_output\n  output_dir = 'output'\n  run_id = 'fixture'\n/\n",
        ),
        (
            "timesteps",
            "&jules_time\n  timestep_len = 3600\n  main_run_start = '1997-01-01 00:00:00'\n/\n",
        ),
    ];

    for name in ParameterSet::NAMES {
        let body = filled
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, body)| *body)
            .unwrap_or("");
        fs::write(namelists_dir.join(format!("{name}.nml")), body).unwrap();
    }

    fs::write(root.join("frac.dat"), "# frac\n0.7 0.2 0.1\n").unwrap();
    fs::create_dir_all(root.join("driving")).unwrap();
    fs::write(
        root.join("driving/met.txt"),
        format!("# met data\n{}", "1 2 3 4 5\n".repeat(10)),
    )
    .unwrap();

    let dataset = Dataset::new()
        .dim("land", 2)
        .variable("tstar", Variable::new(["land"], vec![276.9, 278.1]))
        .attr("source", "fixture");
    io::dataset::write(&root.join("initial.nc"), &dataset).unwrap();
}

#[test]
fn read_builds_attached_portable_configuration() {
    let root = tempfile::tempdir().unwrap();
    write_fixture(root.path(), "namelists");

    let config = Configuration::read(root.path(), ReadOptions::default()).unwrap();
    assert!(!config.is_detached());
    assert_eq!(config.backing_dir(), Some(root.path()));
    assert_eq!(config.namelists_subdir(), Path::new("namelists"));
    assert!(config.is_portable());

    // Bijection: registry keys equal the unique relative file parameters.
    let keys: Vec<&Path> = config.bindings().paths().collect();
    assert_eq!(
        keys,
        vec![
            Path::new("frac.dat"),
            Path::new("driving/met.txt"),
            Path::new("initial.nc"),
        ]
    );

    // The ascii scenario: 10 rows of five values plus the comment.
    let met = config
        .bindings()
        .get(Path::new("driving/met.txt"))
        .unwrap()
        .data()
        .unwrap()
        .as_ascii()
        .unwrap();
    assert_eq!(met.shape(), (10, 5));
    assert_eq!(met.comment, "met data");
}

#[test]
fn write_then_read_round_trips() {
    let root = tempfile::tempdir().unwrap();
    write_fixture(root.path(), "namelists");
    let config = Configuration::read(root.path(), ReadOptions::default()).unwrap();

    let dest = tempfile::tempdir().unwrap();
    let written = config.write(dest.path(), true).unwrap();
    assert_eq!(written.backing_dir(), Some(dest.path()));
    assert_eq!(written, config);

    let reread = Configuration::read(dest.path(), ReadOptions::default()).unwrap();
    assert_eq!(reread, config);

    // Ascii data survives within tolerance; datasets are identical.
    let original = config
        .bindings()
        .get(Path::new("frac.dat"))
        .unwrap()
        .data()
        .unwrap()
        .as_ascii()
        .unwrap()
        .clone();
    let roundtrip = reread
        .bindings()
        .get(Path::new("frac.dat"))
        .unwrap()
        .data()
        .unwrap()
        .as_ascii()
        .unwrap()
        .clone();
    assert!(original.approx_eq(&roundtrip, 1e-4));
}

#[test]
fn lazy_read_is_not_portable_and_write_is_gated() {
    let root = tempfile::tempdir().unwrap();
    write_fixture(root.path(), "namelists");

    let options = ReadOptions {
        eager_load: false,
        ..ReadOptions::default()
    };
    let mut config = Configuration::read(root.path(), options).unwrap();
    assert!(!config.is_portable());

    let dest = tempfile::tempdir().unwrap();
    assert!(matches!(
        config.write(dest.path(), true),
        Err(Error::NotLoaded(_))
    ));

    config.load_data().unwrap();
    assert!(config.is_portable());
    config.write(dest.path(), true).unwrap();
}

#[test]
fn absolute_paths_are_never_bound_and_left_untouched() {
    let root = tempfile::tempdir().unwrap();
    write_fixture(root.path(), "namelists");
    fs::write(
        root.path().join("namelists/prescribed_data.nml"),
        "&jules_prescribed\n  file = '/abs/path/data.nc'\n/\n",
    )
    .unwrap();

    let config = Configuration::read(root.path(), ReadOptions::default()).unwrap();
    assert!(!config.bindings().contains(Path::new("/abs/path/data.nc")));
    assert!(config.is_portable());

    let dest = tempfile::tempdir().unwrap();
    let written = config.write(dest.path(), true).unwrap();
    assert!(!dest.path().join("abs").exists());

    // The parameter value itself survives verbatim.
    let value = written
        .params()
        .namelist("prescribed_data")
        .unwrap()
        .group("jules_prescribed")
        .unwrap()
        .get("file")
        .cloned();
    assert_eq!(value, Some("/abs/path/data.nc".into()));
}

#[test]
fn escaping_relative_path_fails_read() {
    let root = tempfile::tempdir().unwrap();
    write_fixture(root.path(), "namelists");
    fs::write(
        root.path().join("namelists/ancillaries.nml"),
        "&jules_frac\n  file = '../shared/frac.dat'\n/\n",
    )
    .unwrap();

    assert!(matches!(
        Configuration::read(root.path(), ReadOptions::default()),
        Err(Error::InvalidPath { .. })
    ));
}

#[test]
fn discovery_finds_the_single_candidate_and_rejects_two() {
    let root = tempfile::tempdir().unwrap();
    write_fixture(root.path(), "run/namelists");

    let config = Configuration::read(root.path(), ReadOptions::default()).unwrap();
    assert_eq!(config.namelists_subdir(), Path::new("run/namelists"));

    // A second complete namelist set makes discovery ambiguous.
    let duplicate = root.path().join("stale");
    fs::create_dir_all(&duplicate).unwrap();
    for name in ParameterSet::NAMES {
        fs::copy(
            root.path().join(format!("run/namelists/{name}.nml")),
            duplicate.join(format!("{name}.nml")),
        )
        .unwrap();
    }
    match Configuration::read(root.path(), ReadOptions::default()) {
        Err(Error::AmbiguousLocation { candidates }) => {
            assert_eq!(
                candidates,
                vec![PathBuf::from("run/namelists"), PathBuf::from("stale")]
            );
        }
        other => panic!("expected AmbiguousLocation, got {other:?}"),
    }

    // An explicit subdirectory sidesteps discovery entirely.
    let options = ReadOptions {
        namelists_subdir: Some(PathBuf::from("run/namelists")),
        ..ReadOptions::default()
    };
    Configuration::read(root.path(), options).unwrap();
}

#[test]
fn attached_update_rewrites_only_patched_namelists() {
    let root = tempfile::tempdir().unwrap();
    write_fixture(root.path(), "namelists");
    let mut config = Configuration::read(root.path(), ReadOptions::default()).unwrap();

    let canary_path = root.path().join("namelists/drive.nml");
    let canary_before = fs::read_to_string(&canary_path).unwrap();

    let patch = Patch::new().set("timesteps", "jules_time", "timestep_len", 900i64);
    config.update(&patch).unwrap();

    let rewritten = fs::read_to_string(root.path().join("namelists/timesteps.nml")).unwrap();
    assert!(rewritten.contains("timestep_len = 900"));
    assert_eq!(fs::read_to_string(&canary_path).unwrap(), canary_before);
}

#[test]
fn detached_mutation_never_touches_the_source_directory() {
    let root = tempfile::tempdir().unwrap();
    write_fixture(root.path(), "namelists");
    let config = Configuration::read(root.path(), ReadOptions::default()).unwrap();

    let before = fs::read_to_string(root.path().join("namelists/timesteps.nml")).unwrap();
    let mut detached = config.detach();
    assert!(detached.is_detached());
    assert_eq!(detached, config);

    let patch = Patch::new().set("timesteps", "jules_time", "timestep_len", 60i64);
    detached.update(&patch).unwrap();
    assert_eq!(
        fs::read_to_string(root.path().join("namelists/timesteps.nml")).unwrap(),
        before
    );
    assert_ne!(detached, config);
}

#[test]
fn detached_configuration_can_be_made_portable_by_hand() {
    let mut params = ParameterSet::empty();
    params
        .namelist_mut("ancillaries")
        .unwrap()
        .group_or_insert("jules_frac")
        .set("file", "frac.dat");

    let mut config = Configuration::detached(params, ".").unwrap();
    assert!(!config.is_portable());
    config
        .bindings_mut()
        .binding_mut(Path::new("frac.dat"))
        .unwrap()
        .set_data(AsciiData::new(vec![vec![0.6, 0.4]], "frac"))
        .unwrap();
    assert!(config.is_portable());

    let dest = tempfile::tempdir().unwrap();
    let written = config.write(dest.path(), true).unwrap();
    assert!(dest.path().join("frac.dat").is_file());
    assert!(dest.path().join("ancillaries.nml").is_file());
    assert_eq!(written, config);
}

#[cfg(unix)]
mod execution {
    use super::*;
    use jules_kit::{Experiment, JulesExe};
    use std::os::unix::fs::PermissionsExt;

    fn fake_exe(dir: &Path) -> PathBuf {
        let path = dir.join("jules.exe");
        fs::write(&path, "#!/bin/sh\necho done\n").unwrap();
        let mut perms = fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).unwrap();
        path
    }

    #[test]
    fn experiment_create_and_run() {
        let source = tempfile::tempdir().unwrap();
        write_fixture(source.path(), "namelists");
        let config = Configuration::read(source.path(), ReadOptions::default()).unwrap();

        let parent = tempfile::tempdir().unwrap();
        let dir = parent.path().join("exp01");
        let experiment = Experiment::create(&config, &dir).unwrap();
        assert_eq!(experiment.namelists_dir(), dir.join("namelists"));
        assert_eq!(experiment.output_dir(), Some(dir.join("output")));
        assert!(dir.join("output").is_dir());

        let exe_dir = tempfile::tempdir().unwrap();
        let exe = JulesExe::at(fake_exe(exe_dir.path())).unwrap();
        experiment.run(&exe).unwrap();
        assert_eq!(
            fs::read_to_string(dir.join("stdout.log")).unwrap().trim(),
            "done"
        );

        let reopened = Experiment::open(&dir, None).unwrap();
        assert_eq!(reopened.config(), experiment.config());
    }
}
