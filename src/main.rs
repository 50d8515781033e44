use clap::Parser;
use std::path::PathBuf;

use webots_urdf_spawner::*;

pub static NODE_ID: &'static str = "urdf_spawner";

const EXIT_SPAWNED: i32 = 0;
const EXIT_REJECTED: i32 = 1;
const EXIT_ERROR: i32 = 2;

#[derive(Parser)]
#[command(name = "urdf_spawner")]
#[command(about = "Spawn a URDF robot in a running Webots simulation", long_about = None)]
#[command(version)]
struct Cli {
    /// JSON file with the spawn request, flags below override its fields
    #[arg(long)]
    request: Option<PathBuf>,

    /// Name of the robot in the simulation
    #[arg(long)]
    name: Option<String>,

    /// URDF file, as seen by Webots
    #[arg(long)]
    urdf_path: Option<String>,

    /// URDF content
    #[arg(long, conflicts_with = "robot_description_file")]
    robot_description: Option<String>,

    /// File to read the URDF content from
    #[arg(long)]
    robot_description_file: Option<PathBuf>,

    /// Directory the relative paths of the URDF resolve against
    #[arg(long)]
    relative_path_prefix: Option<String>,

    #[arg(long)]
    translation: Option<String>,

    #[arg(long)]
    rotation: Option<String>,

    #[arg(long)]
    normal: bool,

    #[arg(long)]
    box_collision: bool,

    /// Initial joint positions
    #[arg(long)]
    init_pos: Option<String>,

    /// Where the service call output goes: log or screen
    #[arg(long, default_value = "log")]
    output: OutputMode,

    #[arg(long, env = "ROS2_EXECUTABLE", default_value = "ros2")]
    ros2: String,

    /// Print the service call instead of running it. wslpath still runs,
    /// nothing is copied to the shared folder
    #[arg(long)]
    dry_run: bool,

    #[arg(short, long)]
    verbose: bool,

    /// Driver to start once the robot is spawned
    #[arg(last = true)]
    driver: Vec<String>,
}

impl Cli {
    fn spawn_request(&self) -> Result<SpawnRequest, SpawnError> {
        let mut request = match &self.request {
            Some(path) => SpawnRequest::from_json_file(path)?,
            None => SpawnRequest::default(),
        };

        if let Some(path) = &self.robot_description_file {
            let description =
                std::fs::read_to_string(path).map_err(|e| SpawnError::RequestFile {
                    path: path.clone(),
                    reason: e.to_string(),
                })?;
            request.robot_description = Some(description);
        }

        override_with(&mut request.name, &self.name);
        override_with(&mut request.urdf_path, &self.urdf_path);
        override_with(&mut request.robot_description, &self.robot_description);
        override_with(&mut request.relative_path_prefix, &self.relative_path_prefix);
        override_with(&mut request.init_pos, &self.init_pos);
        if let Some(translation) = &self.translation {
            request.translation = translation.clone();
        }
        if let Some(rotation) = &self.rotation {
            request.rotation = rotation.clone();
        }
        request.normal |= self.normal;
        request.box_collision |= self.box_collision;

        Ok(request)
    }
}

fn override_with(field: &mut Option<String>, value: &Option<String>) {
    if value.is_some() {
        *field = value.clone();
    }
}

fn shell_quote(arg: &str) -> String {
    if !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "/_-.:=".contains(c))
    {
        return arg.to_string();
    }
    format!("'{}'", arg.replace('\'', "'\\''"))
}

async fn run(cli: Cli) -> Result<i32, SpawnError> {
    let request = cli.spawn_request()?;
    let spawner = UrdfSpawner::new(HostEnvironment::detect())
        .with_ros2_executable(&cli.ros2)
        .with_output(cli.output);

    if cli.dry_run {
        let command_line = spawner
            .command_line(&spawner.preview(&request)?)
            .iter()
            .map(|arg| shell_quote(arg))
            .collect::<Vec<String>>()
            .join(" ");
        println!("{}", command_line);
        return Ok(EXIT_SPAWNED);
    }

    let message = spawner.prepare_blocking(&request).await?;
    let outcome = spawner.call(&message).await?;
    let driver = DriverLauncher::from_command_line(&cli.driver);

    match classify_spawn_response(&outcome.stdout, driver) {
        Some(Some(driver)) => {
            log::info!(target: NODE_ID, "Robot spawned, starting its driver.");
            let handle = driver.launch()?;
            match handle.await {
                Ok(_) => (),
                Err(e) => log::error!(target: NODE_ID, "Driver task failed: {}", e),
            }
            Ok(EXIT_SPAWNED)
        }
        Some(None) => {
            log::info!(target: NODE_ID, "Robot spawned.");
            Ok(EXIT_SPAWNED)
        }
        None => Ok(EXIT_REJECTED),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            log::error!(target: NODE_ID, "{}", e);
            EXIT_ERROR
        }
    };
    std::process::exit(code)
}
