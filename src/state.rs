// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::blockchain::ChainGateway;
use crate::transfer::TransferController;

#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<TransferController>,
    /// Used directly only for readiness probes.
    pub gateway: Arc<dyn ChainGateway>,
}

impl AppState {
    pub fn new(controller: Arc<TransferController>, gateway: Arc<dyn ChainGateway>) -> Self {
        Self {
            controller,
            gateway,
        }
    }
}
