//! Stands in for the controller by sending scripted status datagrams.

use std::time::Duration;

use anyhow::{Context, Result};
use serde_json::{json, Value};
use tokio::{
    net::UdpSocket,
    time::{sleep, Instant},
};
use tracing::info;

pub struct Emulator {
    socket: UdpSocket,
    status: Value,
}

impl Emulator {
    pub async fn connect(target: &str) -> Result<Emulator> {
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        socket
            .connect(target)
            .await
            .with_context(|| format!("connecting emulator to {target}"))?;

        let emulator = Emulator {
            socket,
            status: json!({
                "FPGA Main State": "0",
                "Action State": "0",
                "Timer": "0",
                "Other Status Elements": "WhatEver",
            }),
        };
        emulator.send().await?;

        Ok(emulator)
    }

    async fn send(&self) -> Result<()> {
        let datagram = serde_json::to_vec(&self.status)?;
        self.socket.send(&datagram).await?;
        Ok(())
    }

    async fn report(&mut self, primary: u8, action: u8) -> Result<()> {
        self.status["FPGA Main State"] = Value::from(primary.to_string());
        self.status["Action State"] = Value::from(action.to_string());
        self.send().await
    }

    pub async fn start(&mut self) -> Result<()> {
        info!("emulating start-up");
        self.report(1, 0).await?;
        sleep(Duration::from_secs(2)).await;
        self.report(2, 0).await?;
        sleep(Duration::from_secs(3)).await;
        self.idle().await?;
        sleep(Duration::from_secs(5)).await;
        Ok(())
    }

    pub async fn idle(&mut self) -> Result<()> {
        self.report(3, 0).await
    }

    /// Runs an experiment for `duration`, reporting the elapsed fraction as
    /// the timer every 100 ms.
    pub async fn experiment(&mut self, duration: Duration) -> Result<()> {
        info!(?duration, "emulating experiment");
        let started = Instant::now();

        self.status["FPGA Main State"] = Value::from("5");
        self.status["Action State"] = Value::from("1");
        while started.elapsed() <= duration {
            let fraction = started.elapsed().as_secs_f64() / duration.as_secs_f64();
            self.status["Timer"] = Value::from(format!("{fraction:.2}"));
            self.send().await?;
            sleep(Duration::from_millis(100)).await;
        }

        self.status["Timer"] = Value::from("0");
        self.idle().await
    }

    pub async fn snap(&mut self) -> Result<()> {
        info!("emulating snap");
        self.report(5, 7).await?;
        self.idle().await
    }

    pub async fn abort(&mut self) -> Result<()> {
        info!("emulating abort");
        self.report(4, 0).await
    }

    /// The whole demo: start-up, an experiment, a snap, then an abort.
    pub async fn run_script(&mut self) -> Result<()> {
        self.start().await?;
        self.experiment(Duration::from_secs(10)).await?;
        sleep(Duration::from_secs(5)).await;
        self.snap().await?;
        sleep(Duration::from_secs(5)).await;
        self.abort().await
    }
}
