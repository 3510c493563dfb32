//! CLI probe for the grading engine.
//!
//! # Responsibility
//! - Verify `gradebook_core` linkage with a deterministic ping/version line.
//! - Expose the pure grade rules for quick local checks:
//!   `grade <total>` and `cgpa <grade_points> <credits>`.

use std::process::ExitCode;

const USAGE: &str = "usage: gradebook_cli [grade <total> | cgpa <grade_points> <credits>]";

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(&args) {
        Ok(lines) => {
            for line in lines {
                println!("{line}");
            }
            ExitCode::SUCCESS
        }
        Err(message) => {
            eprintln!("{message}");
            eprintln!("{USAGE}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &[String]) -> Result<Vec<String>, String> {
    match args {
        [] => Ok(vec![
            format!("gradebook_core ping={}", gradebook_core::ping()),
            format!("gradebook_core version={}", gradebook_core::core_version()),
        ]),
        [command, total] if command == "grade" => {
            let total = parse_number::<f64>("total", total)?;
            let grade = gradebook_core::grade_of(total);
            Ok(vec![format!("grade={grade} grade_point={}", grade.point())])
        }
        [command, points, credits] if command == "cgpa" => {
            let points = parse_number::<f64>("grade_points", points)?;
            let credits = parse_number::<u32>("credits", credits)?;
            Ok(vec![format!(
                "cgpa={:.2}",
                gradebook_core::cgpa_of(points, credits)
            )])
        }
        _ => Err(format!("unrecognized arguments: {}", args.join(" "))),
    }
}

fn parse_number<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T, String> {
    raw.trim()
        .parse()
        .map_err(|_| format!("`{name}` must be a number, got `{raw}`"))
}

#[cfg(test)]
mod tests {
    use super::run;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn no_arguments_prints_ping_and_version() {
        let lines = run(&[]).unwrap();
        assert_eq!(lines[0], "gradebook_core ping=pong");
        assert!(lines[1].starts_with("gradebook_core version="));
    }

    #[test]
    fn grade_command_maps_total_to_band() {
        assert_eq!(
            run(&args(&["grade", "85"])).unwrap(),
            vec!["grade=A+ grade_point=9".to_string()]
        );
    }

    #[test]
    fn cgpa_command_divides_by_credits() {
        assert_eq!(
            run(&args(&["cgpa", "64", "7"])).unwrap(),
            vec!["cgpa=9.14".to_string()]
        );
        assert_eq!(
            run(&args(&["cgpa", "0", "0"])).unwrap(),
            vec!["cgpa=0.00".to_string()]
        );
    }

    #[test]
    fn bad_input_is_reported() {
        assert!(run(&args(&["grade", "ninety"])).unwrap_err().contains("total"));
        assert!(run(&args(&["median"])).is_err());
    }
}
