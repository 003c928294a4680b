//! Windows Service Control Manager integration
//!
//! The SCM calls back into the process on a thread it owns, through a plain
//! `extern "system"` entry point. The dispatcher waiting to be served is
//! parked in a process-wide slot until that callback picks it up and bridges
//! SCM controls and statuses to the dispatcher's channels.

use async_trait::async_trait;
use std::ffi::OsString;
use std::sync::Mutex;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, warn};
use windows_service::service::{
    ServiceControl, ServiceControlAccept, ServiceExitCode, ServiceState, ServiceStatus,
    ServiceType,
};
use windows_service::service_control_handler::{self, ServiceControlHandlerResult};
use windows_service::{define_windows_service, service_dispatcher};

use super::control::{ControlDispatcher, ControlRequest, DispatcherExit, StatusReport};
use super::registrar::ServiceRegistrar;
use crate::error::BoxError;

/// Capacity of the control and status channels
const CHANNEL_CAPACITY: usize = 16;

/// Wait hint reported with pending states
const PENDING_WAIT_HINT: Duration = Duration::from_secs(30);

/// Dispatcher waiting for the SCM to call the service entry point
struct PendingDispatch {
    name: String,
    dispatcher: ControlDispatcher,
    runtime: Handle,
    /// Outcome of serving the dispatcher, read back by the registrar
    outcome: oneshot::Sender<windows_service::Result<()>>,
}

static PENDING: Mutex<Option<PendingDispatch>> = Mutex::new(None);

define_windows_service!(ffi_service_main, service_main);

/// Registrar backed by the Windows Service Control Manager
#[derive(Debug, Clone, Copy, Default)]
pub struct ScmRegistrar;

#[async_trait]
impl ServiceRegistrar for ScmRegistrar {
    async fn run(&self, name: &str, dispatcher: ControlDispatcher) -> Result<(), BoxError> {
        let (outcome_tx, mut outcome_rx) = oneshot::channel();
        {
            let mut pending = PENDING
                .lock()
                .map_err(|_| "service dispatch state poisoned")?;
            if pending.is_some() {
                return Err("a service dispatch is already in progress".into());
            }
            *pending = Some(PendingDispatch {
                name: name.to_string(),
                dispatcher,
                runtime: Handle::current(),
                outcome: outcome_tx,
            });
        }

        let service_name = name.to_string();
        let result = tokio::task::spawn_blocking(move || {
            service_dispatcher::start(service_name, ffi_service_main)
        })
        .await;

        // The SCM never called back if registration failed; drop the parked dispatcher.
        if let Ok(mut pending) = PENDING.lock() {
            pending.take();
        }

        result??;

        // start() also succeeds when the entry point ran but serving failed
        match outcome_rx.try_recv() {
            Ok(served) => served.map_err(Into::into),
            Err(_) => Err("service entry point did not report an outcome".into()),
        }
    }
}

fn service_main(_arguments: Vec<OsString>) {
    let pending = PENDING.lock().ok().and_then(|mut pending| pending.take());
    let Some(pending) = pending else {
        error!("Service entry point called without a pending dispatcher");
        return;
    };

    let PendingDispatch {
        name,
        dispatcher,
        runtime,
        outcome,
    } = pending;

    let served = serve(&name, dispatcher, &runtime);
    if let Err(e) = &served {
        error!(service = %name, error = %e, "Service control dispatch failed");
    }
    if outcome.send(served).is_err() {
        debug!(service = %name, "Service registrar no longer waiting for the outcome");
    }
}

fn serve(
    name: &str,
    dispatcher: ControlDispatcher,
    runtime: &Handle,
) -> windows_service::Result<()> {
    let (request_tx, request_rx) = mpsc::channel(CHANNEL_CAPACITY);
    let (status_tx, mut status_rx) = mpsc::channel(CHANNEL_CAPACITY);

    let event_handler = move |control: ServiceControl| -> ServiceControlHandlerResult {
        let (request, result) = match control {
            ServiceControl::Interrogate => {
                (ControlRequest::Interrogate, ServiceControlHandlerResult::NoError)
            }
            ServiceControl::Stop => (ControlRequest::Stop, ServiceControlHandlerResult::NoError),
            ServiceControl::Shutdown => {
                (ControlRequest::Shutdown, ServiceControlHandlerResult::NoError)
            }
            other => (
                ControlRequest::Unknown(other.raw_service_control_type()),
                ServiceControlHandlerResult::NotImplemented,
            ),
        };
        if let Err(e) = request_tx.try_send(request) {
            warn!(cmd = %request, error = %e, "Dropped control request");
        }
        result
    };

    let status_handle = service_control_handler::register(name, event_handler)?;
    let dispatch = runtime.spawn(dispatcher.execute(request_rx, status_tx));

    let mut checkpoint = 0;
    while let Some(report) = status_rx.blocking_recv() {
        checkpoint += 1;
        debug!(service = %name, status = %report, "Setting service status");
        status_handle.set_service_status(pending_status(report, checkpoint))?;
    }

    let exit = runtime.block_on(dispatch).unwrap_or_else(|e| {
        error!(service = %name, error = %e, "Dispatcher task failed");
        DispatcherExit {
            service_specific: false,
            exit_code: 1,
        }
    });

    status_handle.set_service_status(stopped_status(exit))
}

fn pending_status(report: StatusReport, checkpoint: u32) -> ServiceStatus {
    let (current_state, controls_accepted, checkpoint, wait_hint) = match report {
        StatusReport::StartPending => (
            ServiceState::StartPending,
            ServiceControlAccept::empty(),
            checkpoint,
            PENDING_WAIT_HINT,
        ),
        StatusReport::Running {
            accepts_stop,
            accepts_shutdown,
        } => {
            let mut accepted = ServiceControlAccept::empty();
            if accepts_stop {
                accepted |= ServiceControlAccept::STOP;
            }
            if accepts_shutdown {
                accepted |= ServiceControlAccept::SHUTDOWN;
            }
            (ServiceState::Running, accepted, 0, Duration::default())
        }
        StatusReport::StopPending => (
            ServiceState::StopPending,
            ServiceControlAccept::empty(),
            checkpoint,
            PENDING_WAIT_HINT,
        ),
    };

    ServiceStatus {
        service_type: ServiceType::OWN_PROCESS,
        current_state,
        controls_accepted,
        exit_code: ServiceExitCode::Win32(0),
        checkpoint,
        wait_hint,
        process_id: None,
    }
}

fn stopped_status(exit: DispatcherExit) -> ServiceStatus {
    let exit_code = if exit.service_specific {
        ServiceExitCode::ServiceSpecific(exit.exit_code)
    } else {
        ServiceExitCode::Win32(exit.exit_code)
    };

    ServiceStatus {
        service_type: ServiceType::OWN_PROCESS,
        current_state: ServiceState::Stopped,
        controls_accepted: ServiceControlAccept::empty(),
        exit_code,
        checkpoint: 0,
        wait_hint: Duration::default(),
        process_id: None,
    }
}
