use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;
use tempfile::TempDir;

#[test]
fn command_f1_default_partprob() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("clsim")?;
    let output = cmd
        .arg("tests/cnl/merged.cnl")
        .arg("tests/cnl/singletons.cnl")
        .arg("--f1")
        .output()?;
    let stdout = String::from_utf8(output.stdout)?;

    assert!(output.status.success());
    assert!(stdout.contains("= Multi-resolution Evaluation ="));
    assert!(stdout.contains("F1p_w: 0.333333"));

    Ok(())
}

#[test]
fn command_f1_harmonic() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("clsim")?;
    let output = cmd
        .arg("tests/cnl/merged.cnl")
        .arg("tests/cnl/singletons.cnl")
        .arg("--f1")
        .arg("harmonic")
        .output()?;
    let stdout = String::from_utf8(output.stdout)?;

    assert!(stdout.contains("F1h_w: 0.500000"));

    Ok(())
}

#[test]
fn command_f1_two_rows_vs_merged() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("clsim")?;
    let output = cmd
        .arg("tests/cnl/two.cnl")
        .arg("tests/cnl/whole.cnl")
        .arg("--f1")
        .arg("harmonic")
        .arg("--detailed")
        .output()?;
    let stdout = String::from_utf8(output.stdout)?;

    assert!(stdout.contains("F1h_w: 0.750000"));
    assert!(stdout.contains("recall: 0.750000"));
    assert!(stdout.contains("Loaded 2 clusters 5 nodes from tests/cnl/two.cnl"));

    Ok(())
}

#[test]
fn command_f1_identity() -> anyhow::Result<()> {
    for variant in ["partprob", "harmonic", "average"] {
        let mut cmd = Command::cargo_bin("clsim")?;
        let output = cmd
            .arg("tests/cnl/two.cnl")
            .arg("tests/cnl/two.cnl")
            .arg("--f1")
            .arg(variant)
            .arg("--kind")
            .arg("combined")
            .output()?;
        let stdout = String::from_utf8(output.stdout)?;

        assert!(stdout.contains("_c: 1.000000"), "variant {}", variant);
    }

    Ok(())
}

#[test]
fn command_nmi_identity() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("clsim")?;
    let output = cmd
        .arg("tests/cnl/singletons.cnl")
        .arg("tests/cnl/singletons.cnl")
        .arg("--nmi")
        .output()?;
    let stdout = String::from_utf8(output.stdout)?;

    assert!(output.status.success());
    assert!(stdout.contains("NMI_max: 1.000000"));

    Ok(())
}

#[test]
fn command_nmi_all_normalizations() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("clsim")?;
    let output = cmd
        .arg("tests/cnl/singletons.cnl")
        .arg("tests/cnl/singletons.cnl")
        .arg("--nmi")
        .arg("--all")
        .arg("--ln")
        .output()?;
    let stdout = String::from_utf8(output.stdout)?;

    assert!(stdout.contains("NMI_max: 1.000000"));
    assert!(stdout.contains("NMI_sqrt: 1.000000"));
    assert!(stdout.contains("NMI_avg: 1.000000"));
    assert!(stdout.contains("NMI_min: 1.000000"));

    Ok(())
}

#[test]
fn command_nmi_single_cluster_undefined() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("clsim")?;
    cmd.arg("tests/cnl/merged.cnl")
        .arg("tests/cnl/singletons.cnl")
        .arg("--nmi");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("measure is undefined"));

    Ok(())
}

#[test]
fn command_ovp_banner() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("clsim")?;
    let output = cmd
        .arg("tests/cnl/ovp.cnl")
        .arg("tests/cnl/ovp.cnl")
        .arg("--ovp")
        .arg("--f1")
        .arg("harmonic")
        .output()?;
    let stdout = String::from_utf8(output.stdout)?;

    assert!(stdout.contains("= Overlaps Evaluation ="));
    assert!(stdout.contains("F1h_w: 1.000000"));

    Ok(())
}

#[test]
fn command_omega() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("clsim")?;
    let output = cmd
        .arg("tests/cnl/pair2.cnl")
        .arg("tests/cnl/pair2.cnl")
        .arg("--omega")
        .output()?;
    let stdout = String::from_utf8(output.stdout)?;

    assert!(output.status.success());
    assert!(stdout.contains("Omega: 1.000000"));

    Ok(())
}

#[test]
fn command_omega_extended() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("clsim")?;
    let output = cmd
        .arg("tests/cnl/ovp.cnl")
        .arg("tests/cnl/two.cnl")
        .arg("--extended")
        .output()?;
    let stdout = String::from_utf8(output.stdout)?;

    assert!(output.status.success());
    assert!(stdout.contains("OmegaExt: "));

    Ok(())
}

#[test]
fn command_cluster_id_prefix() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("clsim")?;
    let output = cmd
        .arg("tests/cnl/prefixed.cnl")
        .arg("tests/cnl/pair2.cnl")
        .arg("--f1")
        .arg("harmonic")
        .output()?;
    let stdout = String::from_utf8(output.stdout)?;
    let stderr = String::from_utf8(output.stderr)?;

    assert!(output.status.success());
    // The empty `2>` cluster is skipped with a warning
    assert!(stderr.contains("empty cluster"));
    assert!(stdout.contains("F1h_w: 1.000000"));

    Ok(())
}

#[test]
fn command_label_identifiers() -> anyhow::Result<()> {
    let tempdir = TempDir::new()?;
    let outfile = tempdir.path().join("labels.cll");

    let mut cmd = Command::cargo_bin("clsim")?;
    let output = cmd
        .arg("tests/cnl/pair2.cnl")
        .arg("tests/cnl/pair2.cnl")
        .arg("--label")
        .arg("tests/cnl/pair2.cnl")
        .arg("--identifiers")
        .arg(outfile.to_str().unwrap())
        .output()?;
    let stdout = String::from_utf8(output.stdout)?;

    assert!(output.status.success());
    assert!(stdout.contains("F1_labels: 1.000000"));

    let written = std::fs::read_to_string(&outfile)?;
    assert_eq!(written, "0\n1\n");

    Ok(())
}
