use armplot::job::{self, OutputPaths};
use armplot::{CancelToken, Command, Config, StreamOutcome, YAxis};
use armplot_communication::SerialLink;
use armplot_core::{check_well_formed, files};
use armplot_settings::InputSettings;
use std::collections::VecDeque;
use std::io;
use std::path::Path;
use tempfile::TempDir;

const SQUARE: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 100 100">
  <path d="M10 10 H90 V90 H10 Z"/>
  <path d="M30 30 L70 70"/>
</svg>"#;

fn write_svg(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("square.svg");
    std::fs::write(&path, SQUARE).unwrap();
    path
}

fn config_in(dir: &Path) -> Config {
    let mut config = Config::new();
    config.output.commands_dir = dir.join("out");
    config.connection.settle_delay_ms = 0;
    config.connection.send_delay_ms = 0;
    config.connection.poll_interval_ms = 1;
    config.connection.idle_timeout_ms = 50;
    config.connection.response_timeout_ms = 50;
    config
}

#[test]
fn test_generate_writes_well_formed_commands() {
    let dir = TempDir::new().unwrap();
    let svg = write_svg(dir.path());
    let config = config_in(dir.path());

    let drawing = job::generate(&config, &svg, YAxis::Down, &OutputPaths::default()).unwrap();

    assert_eq!(
        drawing.commands_path,
        dir.path().join("out").join("commands_square.txt")
    );
    assert_eq!(drawing.output.stats.strokes, 2);
    assert!(drawing.points_path.is_none());

    let commands = files::read_commands(&drawing.commands_path).unwrap();
    assert_eq!(commands.len(), drawing.output.commands.len());
    assert!(check_well_formed(&commands).is_ok());
}

#[test]
fn test_generate_with_explicit_paths() {
    let dir = TempDir::new().unwrap();
    let svg = write_svg(dir.path());
    let config = config_in(dir.path());
    let paths = OutputPaths {
        commands: Some(dir.path().join("custom").join("c.txt")),
        points: Some(dir.path().join("p.txt")),
    };

    let drawing = job::generate(&config, &svg, YAxis::Up, &paths).unwrap();

    assert!(dir.path().join("custom").join("c.txt").exists());
    let points = files::read_points(&dir.path().join("p.txt")).unwrap();
    assert_eq!(points, drawing.output.points);
}

#[test]
fn test_generate_reports_missing_svg() {
    let dir = TempDir::new().unwrap();
    let config = config_in(dir.path());
    let err = job::generate(
        &config,
        &dir.path().join("absent.svg"),
        YAxis::Down,
        &OutputPaths::default(),
    )
    .unwrap_err();
    assert!(format!("{:#}", err).contains("absent.svg"));
}

#[test]
fn test_send_requires_a_port() {
    let dir = TempDir::new().unwrap();
    let config = config_in(dir.path());
    let err = job::send(&config, &[Command::Start, Command::End], None, None, CancelToken::new())
        .unwrap_err();
    assert!(format!("{:#}", err).contains("connection.port"));
}

#[test]
fn test_run_without_inputs_fails() {
    let dir = TempDir::new().unwrap();
    let config = config_in(dir.path());
    assert!(job::run(&config, CancelToken::new()).is_err());

    let mut config = config;
    config.inputs.push(InputSettings {
        path: dir.path().join("absent.svg"),
        y_axis: YAxis::Down,
    });
    assert!(job::run(&config, CancelToken::new()).is_err());
}

// Controller that grants every request and stays quiet afterwards.
struct ScriptedLink {
    inbound: VecDeque<u8>,
}

impl SerialLink for ScriptedLink {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        Ok(data.len())
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = buf.len().min(self.inbound.len());
        for slot in buf.iter_mut().take(n) {
            *slot = self.inbound.pop_front().unwrap_or(b'\n');
        }
        Ok(n)
    }

    fn bytes_available(&mut self) -> io::Result<usize> {
        Ok(self.inbound.len())
    }

    fn name(&self) -> String {
        "scripted".to_string()
    }

    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_generated_commands_stream_end_to_end() {
    let dir = TempDir::new().unwrap();
    let svg = write_svg(dir.path());
    let config = config_in(dir.path());
    let drawing = job::generate(&config, &svg, YAxis::Down, &OutputPaths::default()).unwrap();
    let commands = drawing.output.commands;

    let batch = config.transport_config().batch_size();
    let requests = commands.len().div_ceil(batch) + 2;
    let link = ScriptedLink {
        inbound: "REQUEST\n".repeat(requests).into_bytes().into(),
    };

    let report = job::stream_with(&config, &commands, CancelToken::new(), || {
        let link: Box<dyn SerialLink> = Box::new(link);
        Ok(link)
    })
    .unwrap();

    assert_eq!(report.outcome, StreamOutcome::Completed);
    assert_eq!(report.sent, commands.len());
    assert!(report.batches.iter().all(|&b| b <= batch));
}

fn granting_link() -> armplot_core::Result<Box<dyn SerialLink>> {
    let link: Box<dyn SerialLink> = Box::new(ScriptedLink {
        inbound: "REQUEST\n".repeat(64).into_bytes().into(),
    });
    Ok(link)
}

#[test]
fn test_run_skips_unconvertible_inputs() {
    let dir = TempDir::new().unwrap();
    let good = write_svg(dir.path());
    let bad = dir.path().join("broken.svg");
    std::fs::write(&bad, "<svg><path d=\"M 0 0 L oops\"/></svg>").unwrap();

    let mut config = config_in(dir.path());
    for path in [bad.clone(), good.clone()] {
        config.inputs.push(InputSettings {
            path,
            y_axis: YAxis::Down,
        });
    }

    let summary = job::run_with(&config, CancelToken::new(), granting_link).unwrap();

    assert_eq!(summary.skipped.len(), 1);
    assert_eq!(summary.skipped[0].0, bad);
    assert!(summary.skipped[0].1.contains("broken.svg"));
    assert_eq!(summary.sent.len(), 1);
    assert_eq!(summary.sent[0].0, good);
    assert_eq!(summary.sent[0].1.outcome, StreamOutcome::Completed);
    assert!(!summary.is_cancelled());
    assert!(dir.path().join("out").join("commands_square.txt").exists());
}

#[test]
fn test_run_fails_when_no_input_converts() {
    let dir = TempDir::new().unwrap();
    let mut config = config_in(dir.path());
    config.inputs.push(InputSettings {
        path: dir.path().join("absent.svg"),
        y_axis: YAxis::Down,
    });

    let err = job::run_with(&config, CancelToken::new(), granting_link).unwrap_err();
    assert!(format!("{:#}", err).contains("could be converted"));
}
