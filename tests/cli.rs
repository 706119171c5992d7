use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{Duration, Instant};
use tempfile::TempDir;

const FAR_FUTURE: &str = "2099-01-01T00:00:00Z";

/// Isolated home, XDG config, AWS config and SSO cache for one test
struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        let sandbox = Self {
            dir: TempDir::new().unwrap(),
        };
        fs::create_dir_all(sandbox.home()).unwrap();
        fs::create_dir_all(sandbox.xdg()).unwrap();
        fs::write(
            sandbox.aws_config(),
            "[default]\nsso_start_url = https://corp.awsapps.com/start\nsso_region = us-east-1\n",
        )
        .unwrap();
        sandbox
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn home(&self) -> PathBuf {
        self.path().join("home")
    }

    fn xdg(&self) -> PathBuf {
        self.path().join("xdg")
    }

    fn aws_config(&self) -> PathBuf {
        self.path().join("aws-config")
    }

    fn cache_dir(&self) -> PathBuf {
        self.path().join("sso").join("cache")
    }

    fn write_token(&self, expires_at: &str) {
        fs::create_dir_all(self.cache_dir()).unwrap();
        fs::write(
            self.cache_dir().join("token.json"),
            format!(r#"{{"accessToken": "tok", "expiresAt": "{}"}}"#, expires_at),
        )
        .unwrap();
    }

    fn write_wrapper_config(&self, contents: &str) {
        let dir = self.xdg().join("aws-sso-wrapper");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("config.toml"), contents).unwrap();
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_aws-sso-wrapper"));
        cmd.current_dir(self.path())
            .env("HOME", self.home())
            .env("XDG_CONFIG_HOME", self.xdg())
            .env("AWS_CONFIG_FILE", self.aws_config())
            .env("AWS_SSO_CACHE_PATH", self.path().join("sso"))
            .env_remove("AWS_CLI_CACHE_DIR")
            .env_remove("AWS_PROFILE")
            .env_remove("CHROME_PROFILE_IDENTIFIER")
            .env_remove("AWS_SSO_WRAPPER_LAUNCH")
            .env_remove("RUST_LOG");
        cmd
    }

    fn run(&self, args: &[&str]) -> Output {
        self.command().args(args).output().unwrap()
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn help_exits_zero() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&["--help"]);
    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).contains("-- <COMMAND> [ARGS]..."));
    assert!(stdout(&output).contains("CHROME_PROFILE_IDENTIFIER"));
}

#[test]
fn missing_command_is_usage_error() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&[]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("No command specified"));
}

#[test]
fn missing_double_dash_is_usage_error() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&["echo", "hi"]);
    assert_eq!(output.status.code(), Some(2));
}

#[cfg(unix)]
#[test]
fn valid_cache_runs_command_directly() {
    let sandbox = Sandbox::new();
    sandbox.write_token(FAR_FUTURE);

    let output = sandbox.run(&["--", "echo", "hi"]);
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout(&output), "hi\n");
}

#[cfg(unix)]
#[test]
fn wrapped_exit_code_is_propagated() {
    let sandbox = Sandbox::new();
    sandbox.write_token(FAR_FUTURE);

    let output = sandbox.run(&["--", "sh", "-c", "echo out; echo err >&2; exit 3"]);
    assert_eq!(output.status.code(), Some(3));
    assert_eq!(stdout(&output), "out\n");
    assert!(stderr(&output).contains("err"));
}

#[test]
fn unknown_wrapped_command_exits_127() {
    let sandbox = Sandbox::new();
    sandbox.write_token(FAR_FUTURE);

    let output = sandbox.run(&["--", "definitely-not-a-real-command-xyz"]);
    assert_eq!(output.status.code(), Some(127));
}

#[cfg(unix)]
#[test]
fn unmatched_profile_fails_before_any_subprocess() {
    let sandbox = Sandbox::new();
    let marker = sandbox.path().join("ran");

    let output = sandbox
        .command()
        .env("CHROME_PROFILE_IDENTIFIER", "nomatch.com")
        .args(["--", "touch"])
        .arg(&marker)
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(81));
    assert!(stderr(&output).contains("nomatch.com"));
    assert!(!marker.exists());
}

#[cfg(unix)]
#[test]
fn failed_login_surfaces_diagnostics_and_skips_command() {
    let sandbox = Sandbox::new();
    sandbox.write_wrapper_config(
        r#"
[login]
command = "sh -c 'echo login-went-wrong >&2; exit 4'"
"#,
    );
    let marker = sandbox.path().join("ran");

    let output = sandbox
        .command()
        .args(["--", "touch"])
        .arg(&marker)
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(82));
    assert!(stderr(&output).contains("exit code 4"));
    assert!(stderr(&output).contains("login-went-wrong"));
    assert!(!marker.exists());
}

#[cfg(unix)]
#[test]
fn login_without_new_token_is_still_invalid() {
    let sandbox = Sandbox::new();
    sandbox.write_wrapper_config("[login]\ncommand = \"true\"\n");

    let output = sandbox.run(&["--", "echo", "hi"]);
    assert_eq!(output.status.code(), Some(83));
    assert!(stdout(&output).is_empty());
}

#[cfg(target_os = "linux")]
#[test]
fn login_through_matched_profile_then_runs_command() {
    let sandbox = Sandbox::new();

    let profile_dir = sandbox.xdg().join("google-chrome").join("Profile 1");
    fs::create_dir_all(&profile_dir).unwrap();
    fs::write(
        profile_dir.join("Preferences"),
        r#"{"account_info": [{"email": "me@corp.com"}]}"#,
    )
    .unwrap();

    let script = sandbox.path().join("login.sh");
    fs::write(
        &script,
        format!(
            "printf '%s' \"$AWS_SSO_WRAPPER_LAUNCH\" > launch.json\n\
             printf '%s' \"$BROWSER\" > browser.txt\n\
             mkdir -p '{cache}'\n\
             printf '{{\"accessToken\": \"t\", \"expiresAt\": \"{expiry}\"}}' > '{cache}/new.json'\n",
            cache = sandbox.cache_dir().display(),
            expiry = FAR_FUTURE,
        ),
    )
    .unwrap();
    sandbox.write_wrapper_config(&format!(
        "[login]\ncommand = \"sh '{}'\"\n",
        script.display()
    ));

    let output = sandbox
        .command()
        .env("CHROME_PROFILE_IDENTIFIER", "corp.com")
        .args(["--", "echo", "hi"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "hi\n");

    let launch = fs::read_to_string(sandbox.path().join("launch.json")).unwrap();
    assert!(launch.contains("google-chrome"));
    assert!(launch.contains("--profile-directory=Profile 1"));
    let browser = fs::read_to_string(sandbox.path().join("browser.txt")).unwrap();
    assert!(browser.ends_with("aws-sso-wrapper"));
}

#[cfg(target_os = "linux")]
#[test]
fn long_lived_browser_does_not_hold_up_the_command() {
    use std::os::unix::fs::PermissionsExt;

    let sandbox = Sandbox::new();

    let profile_dir = sandbox.xdg().join("google-chrome").join("Default");
    fs::create_dir_all(&profile_dir).unwrap();
    fs::write(
        profile_dir.join("Preferences"),
        r#"{"account_info": [{"email": "me@corp.com"}]}"#,
    )
    .unwrap();

    // Stands in for a browser started fresh, which stays in the foreground
    let bin = sandbox.path().join("bin");
    fs::create_dir_all(&bin).unwrap();
    let browser = bin.join("google-chrome");
    fs::write(&browser, "#!/bin/sh\necho browser-started >&2\nsleep 8\n").unwrap();
    fs::set_permissions(&browser, fs::Permissions::from_mode(0o755)).unwrap();

    let script = sandbox.path().join("login.sh");
    fs::write(
        &script,
        format!(
            "\"$BROWSER\" 'https://device.sso.us-east-1.amazonaws.com/'\n\
             mkdir -p '{cache}'\n\
             printf '{{\"accessToken\": \"t\", \"expiresAt\": \"{expiry}\"}}' > '{cache}/new.json'\n",
            cache = sandbox.cache_dir().display(),
            expiry = FAR_FUTURE,
        ),
    )
    .unwrap();
    sandbox.write_wrapper_config(&format!(
        "[login]\ncommand = \"sh '{}'\"\n",
        script.display()
    ));

    let path = format!(
        "{}:{}",
        bin.display(),
        std::env::var("PATH").unwrap_or_default()
    );
    let started = Instant::now();
    let output = sandbox
        .command()
        .env("PATH", path)
        .env("CHROME_PROFILE_IDENTIFIER", "corp.com")
        .args(["--", "echo", "hi"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "hi\n");
    assert!(
        started.elapsed() < Duration::from_secs(6),
        "waited {:?} for the browser",
        started.elapsed()
    );
}

#[cfg(unix)]
#[test]
fn interrupt_lets_wrapped_command_run_its_own_handler() {
    use std::os::unix::process::CommandExt;
    use std::process::Stdio;

    let sandbox = Sandbox::new();
    sandbox.write_token(FAR_FUTURE);
    let ready = sandbox.path().join("ready");
    let cleaned = sandbox.path().join("cleaned");
    let script = format!(
        "trap 'touch \"{cleaned}\"; exit 5' INT; touch \"{ready}\"; sleep 30",
        cleaned = cleaned.display(),
        ready = ready.display(),
    );

    // Own process group, standing in for the terminal's foreground group
    let mut child = sandbox
        .command()
        .args(["--", "sh", "-c", &script])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .process_group(0)
        .spawn()
        .unwrap();

    let deadline = Instant::now() + Duration::from_secs(10);
    while !ready.exists() && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(50));
    }
    assert!(ready.exists(), "wrapped command never started");
    std::thread::sleep(Duration::from_millis(300));

    let group = format!("-{}", child.id());
    let kill = Command::new("kill")
        .args(["-s", "INT", "--", &group])
        .status()
        .unwrap();
    assert!(kill.success());

    let status = child.wait().unwrap();
    assert_eq!(status.code(), Some(5));
    assert!(cleaned.exists());
}

#[test]
fn status_rejects_trailing_command() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&["--status", "--", "echo", "hi"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stdout(&output).is_empty());
}

#[cfg(unix)]
#[test]
fn hook_mode_opens_url_with_launch_command() {
    let sandbox = Sandbox::new();
    let opened = sandbox.path().join("opened.txt");
    let launch = serde_json::json!({
        "program": "sh",
        "args": ["-c", format!("printf '%s' \"$0\" > '{}'", opened.display())],
    });

    let output = sandbox
        .command()
        .env("AWS_SSO_WRAPPER_LAUNCH", launch.to_string())
        .arg("https://device.sso.us-east-1.amazonaws.com/?user_code=ABCD-EFGH")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));

    // The browser is not awaited; give it a moment
    let deadline = Instant::now() + Duration::from_secs(5);
    while !opened.exists() && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(50));
    }
    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(
        fs::read_to_string(&opened).unwrap(),
        "https://device.sso.us-east-1.amazonaws.com/?user_code=ABCD-EFGH"
    );
}

#[test]
fn status_reports_validity() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&["--status", "--json"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).contains("\"active\":false"));

    sandbox.write_token(FAR_FUTURE);
    let output = sandbox.run(&["--status", "--json"]);
    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).contains("\"active\":true"));
}
