use std::{env, sync::Arc};

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use facemark_admin::{AdminViews, ApprovalQueueController};
use facemark_capture::{CaptureSession, CommandFrameSource, FrameSource, MockFrameSource};
use facemark_client::{HttpTransport, SubmissionClient};
use facemark_ops::{init_tracing, ActivityLog};
use facemark_types::{
    config::{CameraConfig, CaptureConfig, FacemarkConfig, OpsConfig, ServiceConfig},
    outcome::CommandOutcome,
    records::AttendanceFilter,
};
use facemark_workflow::CaptureWorkflow;

mod console;

use console::Console;

#[derive(Parser)]
#[command(name = "facemark", about = "Camera attendance client")]
struct Cli {
    /// Path to the TOML config (falls back to FACEMARK_CONFIG, then configs/dev.toml).
    #[arg(long)]
    config: Option<String>,
    /// Use a synthetic camera instead of the configured grabber.
    #[arg(long)]
    mock_camera: bool,
    #[arg(long)]
    admin_user: Option<String>,
    #[arg(long)]
    admin_password: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Capture an enrollment burst and submit it for approval.
    Enroll {
        #[arg(long)]
        name: String,
    },
    /// Capture one frame and mark attendance.
    Recognize,
    Pending,
    Users,
    Approve { id: i64 },
    Reject { id: i64 },
    Rename { id: i64, name: String },
    /// Delete a user with all attendance and images.
    Delete {
        id: i64,
        #[arg(long)]
        yes: bool,
    },
    History { user_id: i64 },
    Report {
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        user: Option<i64>,
        #[arg(long)]
        device: Option<String>,
    },
    Note { id: i64, note: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.clone());
    init_tracing(&config.ops)?;

    let transport = HttpTransport::new(&config.service)?;
    let client = Arc::new(SubmissionClient::new(transport));
    let activity = ActivityLog::new();
    let console = Arc::new(Console);
    let journal = activity.clone();

    match cli.command {
        Command::Enroll { ref name } => {
            let name = name.clone();
            run_capture(&cli, &config, client, console, activity, |flow| async move {
                flow.enroll(&name).await.map(|_| ())
            })
            .await?
        }
        Command::Recognize => {
            run_capture(&cli, &config, client, console, activity, |flow| async move {
                flow.mark_attendance().await.map(|_| ())
            })
            .await?
        }
        ref admin_command => {
            login(&cli, client.transport()).await?;
            let views = AdminViews {
                pending: console.clone(),
                users: console.clone(),
                history: console.clone(),
                report: console.clone(),
                notifier: console,
            };
            let controller = ApprovalQueueController::new(client, views, activity);
            run_admin(&controller, admin_command).await?;
        }
    }

    for event in journal.snapshot().await {
        tracing::debug!("{} {:?} {:?}", event.timestamp, event.kind, event.payload);
    }
    Ok(())
}

async fn run_capture<F, Fut>(
    cli: &Cli,
    config: &FacemarkConfig,
    client: Arc<SubmissionClient<HttpTransport>>,
    console: Arc<Console>,
    activity: ActivityLog,
    action: F,
) -> Result<()>
where
    F: FnOnce(Arc<CaptureWorkflow<Box<dyn FrameSource>, HttpTransport>>) -> Fut,
    Fut: std::future::Future<Output = facemark_types::Result<()>>,
{
    let source: Box<dyn FrameSource> = if cli.mock_camera {
        Box::new(MockFrameSource::new())
    } else {
        Box::new(CommandFrameSource::new(&config.camera)?)
    };
    let session = CaptureSession::new(source, config.capture.clone());
    let mut flow = CaptureWorkflow::new(
        session,
        client,
        console,
        activity,
        config.camera.device_tag.clone(),
    );
    flow.start_camera().await?;
    action(Arc::new(flow)).await?;
    Ok(())
}

async fn run_admin(
    controller: &ApprovalQueueController<HttpTransport>,
    command: &Command,
) -> Result<()> {
    match command {
        Command::Pending => {
            controller.load_pending().await?;
        }
        Command::Users => {
            controller.load_users().await?;
        }
        Command::Approve { id } => command_result(controller.approve(*id).await)?,
        Command::Reject { id } => command_result(controller.reject(*id).await)?,
        Command::Rename { id, name } => controller.update_user(*id, name).await?,
        Command::Delete { id, yes } => {
            if !yes {
                bail!("Delete user and all attendance & images? Re-run with --yes to confirm.");
            }
            controller.delete_user(*id).await?
        }
        Command::History { user_id } => {
            println!("Attendance for user {user_id}");
            controller.view_attendance(*user_id).await?;
        }
        Command::Report { date, user, device } => {
            let filter = AttendanceFilter::from_inputs(date.as_deref(), *user, device.as_deref());
            controller.load_attendance(&filter).await?;
        }
        Command::Note { id, note } => controller.save_note(*id, note).await?,
        Command::Enroll { .. } | Command::Recognize => {}
    }
    Ok(())
}

/// The queue has already been resynced by the time an outcome arrives, so a
/// refused command only has to set the exit status.
fn command_result(outcome: CommandOutcome) -> Result<()> {
    if outcome.is_success() {
        Ok(())
    } else {
        bail!("{}", outcome.message())
    }
}

async fn login(cli: &Cli, transport: &HttpTransport) -> Result<()> {
    let user = cli
        .admin_user
        .clone()
        .or_else(|| env::var("FACEMARK_ADMIN_USER").ok());
    let password = cli
        .admin_password
        .clone()
        .or_else(|| env::var("FACEMARK_ADMIN_PASSWORD").ok());
    match (user, password) {
        (Some(user), Some(password)) => Ok(transport.login(&user, &password).await?),
        _ => {
            tracing::warn!("No admin credentials given; admin calls may be refused");
            Ok(())
        }
    }
}

fn load_config(from_args: Option<String>) -> FacemarkConfig {
    let from_env = env::var("FACEMARK_CONFIG").ok();
    let path = from_args
        .or(from_env)
        .unwrap_or_else(|| "configs/dev.toml".into());
    match FacemarkConfig::from_file(&path) {
        Ok(cfg) => {
            if let Err(err) = cfg.validate() {
                eprintln!(
                    "Invalid config in '{}': {err}. Falling back to internal defaults.",
                    path
                );
                default_config()
            } else {
                cfg
            }
        }
        Err(err) => {
            eprintln!(
                "Failed to load config from '{}': {err}. Falling back to internal defaults.",
                path
            );
            default_config()
        }
    }
}

fn default_config() -> FacemarkConfig {
    let config = FacemarkConfig {
        camera: CameraConfig {
            command: vec![
                "ffmpeg".into(),
                "-loglevel".into(),
                "error".into(),
                "-f".into(),
                "v4l2".into(),
                "-i".into(),
                "/dev/video0".into(),
                "-frames:v".into(),
                "1".into(),
                "-f".into(),
                "image2pipe".into(),
                "-vcodec".into(),
                "mjpeg".into(),
                "-".into(),
            ],
            native_resolution: None,
            device_tag: "camera".into(),
        },
        service: ServiceConfig {
            base_url: "http://127.0.0.1:5000".into(),
            timeout_ms: 30_000,
        },
        capture: CaptureConfig::default(),
        ops: OpsConfig {
            log_level: "info".into(),
        },
    };
    debug_assert!(config.validate().is_ok());
    config
}
