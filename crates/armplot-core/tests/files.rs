use armplot_core::{files, Command, Error, FileFormatError, PathPoint, Point};
use tempfile::TempDir;

#[test]
fn test_points_file_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("points_star.txt");
    let points = vec![
        PathPoint::Coord(Point::new(1.0, 1.0)),
        PathPoint::Coord(Point::new(2.5, -0.125)),
        PathPoint::Gap,
        PathPoint::Coord(Point::new(3.0, 4.0)),
    ];

    files::write_points(&path, &points).unwrap();
    assert_eq!(files::read_points(&path).unwrap(), points);
}

#[test]
fn test_commands_file_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("commands_star.txt");
    let commands = vec![
        Command::Start,
        Command::PenDown,
        Command::Move {
            theta1: 12.5,
            theta2: 97.25,
        },
        Command::PenUp,
        Command::End,
    ];

    files::write_commands(&path, &commands).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(
        text,
        "START\nPEN DOWN\n(12.5000, 97.2500)\nPEN UP\nEND\n"
    );
    assert_eq!(files::read_commands(&path).unwrap(), commands);
}

#[test]
fn test_hand_edited_command_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("edited.txt");
    std::fs::write(&path, "# test square\nSTART\n\nPEN DOWN\n  (0, 90)  \nPEN UP\nEND\n").unwrap();

    let commands = files::read_commands(&path).unwrap();
    assert_eq!(commands.len(), 5);
    assert_eq!(
        commands[2],
        Command::Move {
            theta1: 0.0,
            theta2: 90.0
        }
    );
}

#[test]
fn test_bad_line_reports_line_number() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.txt");
    std::fs::write(&path, "START\nPEN DOWN\n(1, 2, 3)\nEND\n").unwrap();

    match files::read_commands(&path).unwrap_err() {
        Error::FileFormat(FileFormatError::InvalidLine { line_number, .. }) => {
            assert_eq!(line_number, 3)
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_comment_only_file_is_empty() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("empty.txt");
    std::fs::write(&path, "# nothing here\n\n").unwrap();

    assert!(matches!(
        files::read_commands(&path),
        Err(Error::FileFormat(FileFormatError::EmptyCommandSet { .. }))
    ));
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    assert!(matches!(
        files::read_points(&dir.path().join("nope.txt")),
        Err(Error::Io(_))
    ));
}
