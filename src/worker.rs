//! Swaps on a background thread, with results delivered over a channel.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, TryRecvError};
use std::sync::Arc;
use std::thread;

use image::RgbImage;

use crate::config::SwapOptions;
use crate::error::{Error, Result};
use crate::swap::{FaceSwapper, SwapResult};
use crate::types::PointSet;

static WORKER_SEQ: AtomicUsize = AtomicUsize::new(0);

/// Owned inputs of one swap.
#[derive(Debug, Clone)]
pub struct SwapJob {
    pub image_a: RgbImage,
    pub landmarks_a: Option<PointSet>,
    pub image_b: RgbImage,
    pub landmarks_b: Option<PointSet>,
}

enum Message {
    Run(Box<SwapJob>),
    Terminate,
}

/// A named thread running queued swaps in order.
///
/// Each submitted job produces exactly one result. Dropping the worker
/// finishes the job in progress, skips the rest of the queue and joins the
/// thread.
pub struct SwapWorker {
    id: usize,
    stop: Arc<AtomicBool>,
    sender: mpsc::Sender<Message>,
    receiver: mpsc::Receiver<Result<SwapResult>>,
    thread: Option<thread::JoinHandle<usize>>,
}

impl SwapWorker {
    pub fn new(options: SwapOptions) -> Result<Self> {
        let id = WORKER_SEQ.fetch_add(1, Ordering::SeqCst);
        let (sender, jobs) = mpsc::channel();
        let (done, receiver) = mpsc::channel();
        let swapper = FaceSwapper::new(options);
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop);

        let thread = thread::Builder::new()
            .name(format!("face-swap-{id}"))
            .spawn(move || serve(&swapper, &jobs, &done, &thread_stop))?;

        log::debug!("started swap worker {id}");
        Ok(Self {
            id,
            stop,
            sender,
            receiver,
            thread: Some(thread),
        })
    }

    pub fn send(&self, job: SwapJob) -> Result<()> {
        self.sender
            .send(Message::Run(Box::new(job)))
            .map_err(|_| Error::WorkerDisconnected)
    }

    /// Block until the next result arrives.
    pub fn recv(&self) -> Result<Result<SwapResult>> {
        self.receiver.recv().map_err(|_| Error::WorkerDisconnected)
    }

    /// The next result if one is ready.
    pub fn try_recv(&self) -> Result<Option<Result<SwapResult>>> {
        match self.receiver.try_recv() {
            Ok(result) => Ok(Some(result)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(Error::WorkerDisconnected),
        }
    }
}

/// Run jobs in order until terminated, disconnected or stopped.
///
/// `stop` is checked before every job, so jobs still queued when it is set
/// are dropped without running.
fn serve(
    swapper: &FaceSwapper,
    jobs: &mpsc::Receiver<Message>,
    done: &mpsc::Sender<Result<SwapResult>>,
    stop: &AtomicBool,
) -> usize {
    let mut ran = 0;
    while let Ok(Message::Run(job)) = jobs.recv() {
        if stop.load(Ordering::SeqCst) {
            break;
        }
        let result = swapper.swap(
            &job.image_a,
            job.landmarks_a.as_ref(),
            &job.image_b,
            job.landmarks_b.as_ref(),
        );
        ran += 1;
        if done.send(result).is_err() {
            break;
        }
    }
    ran
}

impl Drop for SwapWorker {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        let _ = self.sender.send(Message::Terminate);
        log::debug!("shutting down swap worker {}", self.id);
        if let Some(thread) = self.thread.take() {
            match thread.join() {
                Ok(ran) => log::debug!("swap worker {} ran {ran} jobs", self.id),
                Err(_) => log::warn!("swap worker {} panicked", self.id),
            }
        }
    }
}
