//! Headless driver: replays recorded detector frames through the engine
//! and prints engine events as JSON lines. Useful for exercising the state
//! machines end to end against a live desktop helper without a camera.
//!
//! Usage: `handwave [replay.jsonl]`, config from `HANDWAVE_CONFIG`
//! (defaults to `handwave.json` next to the binary, falling back to
//! defaults when absent).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::info;
use serde::Deserialize;

use handwave::config::Config;
use handwave::geometry::Point;
use handwave::landmarks::{
    FrameSize, HandFrame, Handedness, Keypoint, KeypointName, PoseFrame,
};
use handwave::sensing::{Engine, ReplayHandDetector, ReplayPoseDetector};

#[derive(Deserialize)]
struct ReplayKeypoint {
    name: String,
    x: f64,
    y: f64,
    score: f64,
}

/// One recorded detector result. Pose and hand records interleave freely;
/// the engine consumes each stream at its own cadence.
#[derive(Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum ReplayRecord {
    Pose {
        keypoints: Vec<ReplayKeypoint>,
        width: f64,
        height: f64,
    },
    Hand {
        points: Vec<[f64; 2]>,
        handedness: Option<String>,
    },
    NoPose,
    NoHand,
}

fn load_replay(path: &Path) -> Result<(Vec<Option<PoseFrame>>, Vec<Option<HandFrame>>)> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read replay from {}", path.display()))?;

    let mut poses = Vec::new();
    let mut hands = Vec::new();

    for (line_no, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let record: ReplayRecord = serde_json::from_str(line)
            .with_context(|| format!("Bad replay record on line {}", line_no + 1))?;

        match record {
            ReplayRecord::Pose {
                keypoints,
                width,
                height,
            } => {
                let keypoints = keypoints
                    .into_iter()
                    .map(|kp| {
                        let name = KeypointName::from_str(&kp.name)
                            .with_context(|| format!("Unknown keypoint {}", kp.name))?;
                        Ok(Keypoint {
                            name,
                            x: kp.x,
                            y: kp.y,
                            score: kp.score,
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                poses.push(Some(PoseFrame::from_keypoints(
                    keypoints,
                    FrameSize { width, height },
                )?));
            }
            ReplayRecord::Hand { points, handedness } => {
                let points = points.into_iter().map(|[x, y]| Point::new(x, y)).collect();
                let handedness = match handedness.as_deref() {
                    Some("Left") => Some(Handedness::Left),
                    Some("Right") => Some(Handedness::Right),
                    _ => None,
                };
                hands.push(Some(HandFrame::from_points(points, handedness)?));
            }
            ReplayRecord::NoPose => poses.push(None),
            ReplayRecord::NoHand => hands.push(None),
        }
    }

    Ok((poses, hands))
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let config_path = std::env::var("HANDWAVE_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("handwave.json"));
    let config = Config::load_or_default(&config_path)?;

    let replay = std::env::args().nth(1).map(PathBuf::from);

    let (pose_detector, hand_detector) = match replay {
        Some(path) => {
            let (poses, hands) = load_replay(&path)?;
            info!(
                "Replaying {} pose and {} hand frames from {}",
                poses.len(),
                hands.len(),
                path.display()
            );
            (
                Some(ReplayPoseDetector::new(poses)),
                Some(ReplayHandDetector::new(hands)),
            )
        }
        None => {
            info!("No replay given; running with detectors disabled");
            (None, None)
        }
    };

    let (engine, mut events) = Engine::start(config, pose_detector, hand_detector);
    let handle = engine.handle();
    handle.start_timer();

    info!("Engine running, ctrl-c to stop");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = events.recv() => {
                match event {
                    Some(event) => println!("{}", serde_json::to_string(&event)?),
                    None => break,
                }
            }
        }
    }

    engine.shutdown().await;
    Ok(())
}
