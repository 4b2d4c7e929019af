//! Parameter endpoint
//!
//! Turns one request buffer into one response. The transport (accept, read,
//! write, close) lives in the firmware; everything here is synchronous and
//! never blocks: a full motor queue drops the new command.

use embassy_sync::blocking_mutex::raw::RawMutex;

use crate::mailbox::{CommandQueue, EnqueueOutcome};
use crate::params::{DriverFeedback, MergeReport, MotorParameters, SharedParameters};

use super::response::{self, Response};
use super::route::Route;

/// What handling a request did, for logging
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RequestOutcome {
    /// Status reported, with the feedback it was derived from
    Status { feedback: DriverFeedback },
    /// Parameters merged and the snapshot offered to the motor queue
    Updated {
        params: MotorParameters,
        report: MergeReport,
        enqueue: EnqueueOutcome,
    },
    /// Unknown request
    NotFound,
}

/// A rendered response plus what was done to produce it
#[derive(Debug, Clone)]
pub struct Reply {
    pub response: Response,
    pub outcome: RequestOutcome,
}

/// Handles `/getParams` and `/setParams` against the shared store
pub struct Endpoint<'a, M: RawMutex, const N: usize> {
    params: &'a SharedParameters<M>,
    commands: &'a CommandQueue<M, MotorParameters, N>,
}

impl<'a, M: RawMutex, const N: usize> Endpoint<'a, M, N> {
    pub fn new(
        params: &'a SharedParameters<M>,
        commands: &'a CommandQueue<M, MotorParameters, N>,
    ) -> Self {
        Self { params, commands }
    }

    /// Handle one raw request
    pub fn handle(&self, request: &[u8]) -> Reply {
        match Route::from_request(request) {
            Route::GetParams => {
                let (params, feedback) = self.params.status();
                Reply {
                    response: response::status(&params, &feedback),
                    outcome: RequestOutcome::Status { feedback },
                }
            }
            Route::SetParams { query } => {
                let (params, report) = self.params.merge_query(query);
                let enqueue = self.commands.post(params);
                Reply {
                    response: response::update(&params),
                    outcome: RequestOutcome::Updated {
                        params,
                        report,
                        enqueue,
                    },
                }
            }
            Route::NotFound => Reply {
                response: response::not_found(),
                outcome: RequestOutcome::NotFound,
            },
        }
    }
}
