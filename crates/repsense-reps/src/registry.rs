//! Registry of concurrently running sessions.
//!
//! Each session owns its own counter behind its own lock. The map lock is held
//! only long enough to find a session, so independent streams can be driven
//! from separate tasks without waiting on each other.

use std::collections::HashMap;
use std::sync::Arc;

use repsense_core::{EngineConfig, Error, FrameIndex, PoseFrame, Result, SessionId};
use tokio::sync::{Mutex, RwLock};

use crate::classifier::ExerciseClassifier;
use crate::session::{FrameReport, SessionReport, WorkoutSession};

pub struct SessionRegistry {
    config: EngineConfig,
    classifier: Arc<dyn ExerciseClassifier>,
    sessions: RwLock<HashMap<SessionId, Arc<Mutex<WorkoutSession>>>>,
}

impl SessionRegistry {
    pub fn new(config: EngineConfig, classifier: Arc<dyn ExerciseClassifier>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            classifier,
            sessions: RwLock::new(HashMap::new()),
        })
    }

    /// Start a session that detects its exercise from the warm-up window
    pub async fn create(&self) -> Result<SessionId> {
        let session = WorkoutSession::new(self.config.clone(), self.classifier.clone())?;
        Ok(self.register(session).await)
    }

    /// Start a session tracking a known exercise
    pub async fn create_for(&self, label: &str) -> Result<SessionId> {
        let session =
            WorkoutSession::new(self.config.clone(), self.classifier.clone())?.with_exercise(label)?;
        Ok(self.register(session).await)
    }

    async fn register(&self, session: WorkoutSession) -> SessionId {
        let id = session.id();
        self.sessions
            .write()
            .await
            .insert(id, Arc::new(Mutex::new(session)));
        tracing::debug!("Session {} registered", id);
        id
    }

    pub async fn process_frame(
        &self,
        id: SessionId,
        frame_index: FrameIndex,
        frame: Option<&PoseFrame>,
    ) -> Result<FrameReport> {
        let session = self.session(id).await?;
        let mut session = session.lock().await;
        session.process_frame(frame_index, frame)
    }

    /// Snapshot report for a running session
    pub async fn report(&self, id: SessionId, source: &str) -> Result<SessionReport> {
        let session = self.session(id).await?;
        let report = session.lock().await.report(source);
        Ok(report)
    }

    /// End a session and return its final report
    pub async fn finish(&self, id: SessionId, source: &str) -> Result<SessionReport> {
        let session = self
            .sessions
            .write()
            .await
            .remove(&id)
            .ok_or_else(|| Error::UnknownSession(id.to_string()))?;

        // A concurrent caller may still hold the session for an in-flight frame
        match Arc::try_unwrap(session) {
            Ok(session) => Ok(session.into_inner().finish(source)),
            Err(shared) => Ok(shared.lock().await.report(source)),
        }
    }

    async fn session(&self, id: SessionId) -> Result<Arc<Mutex<WorkoutSession>>> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::UnknownSession(id.to_string()))
    }

    pub async fn active_sessions(&self) -> Vec<SessionId> {
        self.sessions.read().await.keys().copied().collect()
    }

    pub async fn clear_all(&self) {
        self.sessions.write().await.clear();
    }
}
