//! Integration tests for the kubechart binary

use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

const MANIFESTS: &str = r#"
apiVersion: apps/v1
kind: Deployment
metadata:
  name: api
  labels: {app: api}
spec:
  replicas: 2
  selector:
    matchLabels: {app: api}
  template:
    metadata:
      labels: {app: api}
    spec:
      containers:
        - name: api
          image: example/api:1.0
          ports: [{containerPort: 8080}]
---
apiVersion: v1
kind: Service
metadata:
  name: api
spec:
  selector: {app: api}
  ports: [{port: 80, targetPort: 8080}]
---
apiVersion: apps/v1
kind: Deployment
metadata:
  name: worker
spec:
  replicas: 1
  selector:
    matchLabels: {app: worker}
  template:
    metadata:
      labels: {app: worker}
    spec:
      containers:
        - name: worker
          image: example/worker:1.0
"#;

fn kubechart() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_kubechart"));
    for (key, _) in std::env::vars() {
        if key.starts_with("KUBECHART_") {
            cmd.env_remove(key);
        }
    }
    cmd.env("NO_COLOR", "1");
    cmd
}

fn convert(dir: &Path, extra: &[&str]) -> Output {
    let manifests = dir.join("manifests.yaml");
    std::fs::write(&manifests, MANIFESTS).unwrap();
    let config = dir.join("no-config.yaml");
    std::fs::write(&config, "{}\n").unwrap();

    kubechart()
        .arg("convert")
        .arg(&manifests)
        .arg("--output")
        .arg(dir.join("out"))
        .arg("--config")
        .arg(&config)
        .args(extra)
        .output()
        .expect("failed to run kubechart")
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

#[test]
fn test_universal_conversion() {
    let dir = tempfile::tempdir().unwrap();
    let output = convert(dir.path(), &["--name", "shop"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let chart = dir.path().join("out/shop");
    assert!(chart.join("Chart.yaml").is_file());
    assert!(chart.join("templates/_helpers.tpl").is_file());
    assert!(chart.join("templates/NOTES.txt").is_file());
    assert!(chart.join("templates/api-deployment.yaml").is_file());
    assert!(chart.join("templates/api-service.yaml").is_file());
    assert!(chart.join("templates/worker-deployment.yaml").is_file());

    let values: serde_yaml::Value =
        serde_yaml::from_str(&std::fs::read_to_string(chart.join("values.yaml")).unwrap()).unwrap();
    assert_eq!(values["services"]["api"]["deployment"]["replicas"], 2);
    assert_eq!(values["services"]["worker"]["deployment"]["replicas"], 1);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Summary"));
}

#[test]
fn test_umbrella_layout() {
    let dir = tempfile::tempdir().unwrap();
    let output = convert(dir.path(), &["--name", "shop", "--mode", "umbrella"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let parent = dir.path().join("out/shop");
    assert!(parent.join("Chart.lock").is_file());
    assert!(parent.join("charts/api/Chart.yaml").is_file());
    assert!(parent.join("charts/worker/Chart.yaml").is_file());

    let chart_yaml = std::fs::read_to_string(parent.join("Chart.yaml")).unwrap();
    assert!(chart_yaml.contains("condition: api.enabled"));
    assert!(chart_yaml.contains("repository: file://charts/worker"));
}

#[test]
fn test_existing_output_requires_force() {
    let dir = tempfile::tempdir().unwrap();
    assert!(convert(dir.path(), &["--name", "shop"]).status.success());

    let again = convert(dir.path(), &["--name", "shop"]);
    assert_eq!(again.status.code(), Some(5));
    assert!(stderr(&again).contains("--force"));

    let forced = convert(dir.path(), &["--name", "shop", "--force"]);
    assert!(forced.status.success(), "stderr: {}", stderr(&forced));
}

#[test]
fn test_unknown_mode_suggests_closest() {
    let dir = tempfile::tempdir().unwrap();
    let output = convert(dir.path(), &["--mode", "umbrela"]);
    assert_eq!(output.status.code(), Some(64));
    assert!(stderr(&output).contains("did you mean 'umbrella'"));
    assert!(!dir.path().join("out").exists());
}

#[test]
fn test_invalid_chart_version() {
    let dir = tempfile::tempdir().unwrap();
    let output = convert(dir.path(), &["--chart-version", "one"]);
    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn test_no_resources_is_input_error() {
    let dir = tempfile::tempdir().unwrap();
    let empty = dir.path().join("empty");
    std::fs::create_dir(&empty).unwrap();
    let config = dir.path().join("no-config.yaml");
    std::fs::write(&config, "{}\n").unwrap();

    let output = kubechart()
        .arg("convert")
        .arg(&empty)
        .arg("--output")
        .arg(dir.path().join("out"))
        .arg("--config")
        .arg(&config)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_kind_filter_excluding_everything() {
    let dir = tempfile::tempdir().unwrap();
    let output = convert(dir.path(), &["--kind", "CronJob"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("--kind"));
}

#[test]
fn test_dry_run_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let output = convert(dir.path(), &["--name", "shop", "--dry-run"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(!dir.path().join("out").exists());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Dry run"));
}

#[test]
fn test_reads_stdin() {
    let dir = tempfile::tempdir().unwrap();
    let mut child = kubechart()
        .args(["convert", "-", "--name", "shop", "--mode", "separate", "--output"])
        .arg(dir.path())
        .env("XDG_CONFIG_HOME", dir.path().join("xdg"))
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(MANIFESTS.as_bytes())
        .unwrap();
    let output = child.wait_with_output().unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    assert!(dir.path().join("api/Chart.yaml").is_file());
    assert!(dir.path().join("worker/Chart.yaml").is_file());
}

#[test]
fn test_config_file_supplies_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let manifests = dir.path().join("manifests.yaml");
    std::fs::write(&manifests, MANIFESTS).unwrap();
    let config = dir.path().join("kubechart.yaml");
    std::fs::write(&config, "chartName: store\nchartVersion: 1.4.0\nmode: library\n").unwrap();

    let output = kubechart()
        .arg("convert")
        .arg(&manifests)
        .arg("--output")
        .arg(dir.path().join("out"))
        .arg("--config")
        .arg(&config)
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let library = dir.path().join("out/store-library/Chart.yaml");
    let chart_yaml = std::fs::read_to_string(library).unwrap();
    assert!(chart_yaml.contains("type: library"));
    assert!(chart_yaml.contains("version: 1.4.0"));
    assert!(dir.path().join("out/api/Chart.lock").is_file());
}
