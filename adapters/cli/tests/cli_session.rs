use std::process::{Command, Output};

fn maze_chase(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_maze-chase"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to launch maze-chase")
}

fn progress_code(stdout: &str) -> String {
    stdout
        .lines()
        .find_map(|line| line.strip_prefix("progress: "))
        .expect("progress line present")
        .to_owned()
}

#[test]
fn identical_seeds_print_identical_sessions() {
    let args = ["--seed", "21", "--moves", "ddssddwwaassdd", "--events"];
    let first = maze_chase(&args);
    let second = maze_chase(&args);

    assert!(first.status.success());
    assert_eq!(first.stdout, second.stdout);
    let stdout = String::from_utf8(first.stdout).expect("utf-8 output");
    assert!(stdout.contains("event: PlayerMoved") || stdout.contains("event: PlayerBumped"));
}

#[test]
fn progress_code_resumes_a_session() {
    let first = maze_chase(&["--seed", "5", "--level", "4", "--score", "120", "--bombs", "1"]);
    assert!(first.status.success());
    let stdout = String::from_utf8(first.stdout).expect("utf-8 output");
    let code = progress_code(&stdout);
    assert!(code.starts_with("chase:v1:4:"));

    let resumed = maze_chase(&["--seed", "6", "--resume", &code]);
    assert!(resumed.status.success());
    let stdout = String::from_utf8(resumed.stdout).expect("utf-8 output");
    assert!(stdout.contains("Level 4 (Tomb) | Score 120 |"));
    assert_eq!(progress_code(&stdout), code);
}

#[test]
fn malformed_input_fails_with_context() {
    let bad_moves = maze_chase(&["--moves", "dq"]);
    assert!(!bad_moves.status.success());
    let stderr = String::from_utf8(bad_moves.stderr).expect("utf-8 output");
    assert!(stderr.contains("invalid --moves script"));

    let bad_code = maze_chase(&["--resume", "chase:v1:0:e30"]);
    assert!(!bad_code.status.success());
    let stderr = String::from_utf8(bad_code.stderr).expect("utf-8 output");
    assert!(stderr.contains("invalid --resume code"));
}
