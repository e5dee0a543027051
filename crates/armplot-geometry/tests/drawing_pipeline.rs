use armplot_core::{check_well_formed, ArmGeometry, Command, PathPoint, Point, YAxis};
use armplot_geometry::{DrawingPipeline, PipelineConfig, Segment};

fn pipeline(margin: f64) -> DrawingPipeline {
    DrawingPipeline::new(PipelineConfig {
        arm: ArmGeometry::new(10.0, 10.0).unwrap(),
        samples_per_segment: 10,
        tolerance: 0.0,
        margin,
    })
    .unwrap()
}

fn pen_commands(commands: &[Command]) -> Vec<Command> {
    commands.iter().copied().filter(Command::is_pen).collect()
}

#[test]
fn test_single_line_drawing() {
    let path = vec![Segment::line(Point::new(0.0, 10.0), Point::new(10.0, 10.0))];
    let out = pipeline(1.0).run(&[path], YAxis::Down).unwrap();

    assert!(matches!(
        out.commands.as_slice(),
        [
            Command::Start,
            Command::PenDown,
            Command::Move { .. },
            Command::Move { .. },
            Command::PenUp,
            Command::End
        ]
    ));
    assert!(out.dropped.is_empty());

    let first = out.points[0].coord().unwrap();
    assert!((first.x - 1.0).abs() < 1e-9);
    assert!((first.y - 1.0).abs() < 1e-9);
}

#[test]
fn test_two_strokes_add_one_pen_pair() {
    let single = pipeline(1.0)
        .run_svg(r#"<svg><path d="M0 0 L10 0"/></svg>"#, YAxis::Up)
        .unwrap();
    let double = pipeline(1.0)
        .run_svg(r#"<svg><path d="M0 0 L10 0 M0 10 L10 10"/></svg>"#, YAxis::Up)
        .unwrap();

    assert_eq!(double.stats.strokes, 2);
    assert_eq!(pen_commands(&single.commands).len() + 2, pen_commands(&double.commands).len());
    assert_eq!(
        pen_commands(&double.commands),
        vec![Command::PenDown, Command::PenUp, Command::PenDown, Command::PenUp]
    );
    assert!(check_well_formed(&double.commands).is_ok());

    let gaps = double.points.iter().filter(|p| p.is_gap()).count();
    assert_eq!(gaps, 2);
    assert!(double.points.windows(2).all(|w| !(w[0].is_gap() && w[1].is_gap())));
}

#[test]
fn test_every_mapped_point_is_within_reach() {
    let svg = r#"<svg>
        <path d="M0 0 C20 40 60 -20 80 30 S120 90 40 60 Z"/>
        <polyline points="5,5 70,5 70,55 5,55"/>
        <path d="M10 10 A30 20 0 1 0 60 40"/>
    </svg>"#;
    let margin = 1.5;
    let out = pipeline(margin).run_svg(svg, YAxis::Down).unwrap();

    for p in out.points.iter().filter_map(PathPoint::coord) {
        assert!(p.norm() <= 20.0 - margin + 1e-9, "{p} outside reach");
        assert!(p.x >= margin - 1e-9 && p.y >= margin - 1e-9);
    }
    assert!(out.dropped.is_empty());
    assert!(check_well_formed(&out.commands).is_ok());
}

#[test]
fn test_tolerance_reduces_nodes() {
    let svg = r#"<svg><path d="M0 0 Q50 80 100 0"/></svg>"#;
    let fine = pipeline(1.0).run_svg(svg, YAxis::Down).unwrap();
    let coarse = DrawingPipeline::new(PipelineConfig {
        arm: ArmGeometry::new(10.0, 10.0).unwrap(),
        samples_per_segment: 10,
        tolerance: 5.0,
        margin: 1.0,
    })
    .unwrap()
    .run_svg(svg, YAxis::Down)
    .unwrap();

    assert_eq!(fine.stats.raw_points, coarse.stats.raw_points);
    assert!(coarse.stats.nodes < fine.stats.nodes);
    assert!(coarse.commands.len() < fine.commands.len());
}

#[test]
fn test_commands_survive_file_round_trip() {
    let out = pipeline(1.0)
        .run_svg(r#"<svg><line x1="0" y1="0" x2="3" y2="4"/></svg>"#, YAxis::Up)
        .unwrap();
    let text: String = out.commands.iter().map(|c| format!("{}\n", c)).collect();
    let parsed = armplot_core::files::parse_commands(text.as_bytes()).unwrap();
    assert_eq!(parsed.len(), out.commands.len());
    assert!(check_well_formed(&parsed).is_ok());
}

#[test]
fn test_bad_svg_is_rejected() {
    assert!(pipeline(1.0).run_svg("<svg><path d=\"M0 0 L\"/></svg>", YAxis::Down).is_err());
    assert!(pipeline(1.0).run_svg("<svg></svg>", YAxis::Down).is_err());
}
