//! Actor-backed resolution table
//!
//! Declarations are stored by owner key and name. A single task owns the
//! buckets and processes a totally ordered message queue; every operation on
//! [`ResolutionTable`] is a request/response round-trip to that task, so the
//! buckets are never shared between tasks.
//!
//! Lookups may be issued before the declaration they need has been
//! registered. A missing lookup waits on a broadcast of new registrations:
//!
//! 1. subscribe to the broadcast and wait for the subscription to be confirmed,
//! 2. only then re-check the buckets (the authoritative miss-check),
//! 3. wait for a matching registration or for the end of resolution.
//!
//! Registrations that happen between a first miss and the subscription are
//! therefore always seen by step 2. The actor itself never waits.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, info, trace, warn};

use crate::declaration::Named;
use crate::error::ResolutionError;
use crate::resolution::signature::Signature;
use crate::unit::CompilationUnit;

/// Default number of registrations a waiting lookup may fall behind by
pub const DEFAULT_EVENT_BUFFER: usize = 256;

/// Owner key -> name -> declarations in registration order
pub type TableSnapshot<T> = HashMap<String, HashMap<String, Vec<T>>>;

/// A declaration together with where it was registered from
#[derive(Debug, Clone)]
pub struct ResolvedDeclaration<T> {
    pub owner: String,
    pub source: Option<Arc<CompilationUnit>>,
    pub declaration: T,
}

impl<T> ResolvedDeclaration<T> {
    pub fn new(owner: impl Into<String>, source: Option<Arc<CompilationUnit>>, declaration: T) -> Self {
        Self {
            owner: owner.into(),
            source,
            declaration,
        }
    }
}

enum ResolutionEvent<T> {
    Registered(Arc<ResolvedDeclaration<T>>),
    Ended,
}

impl<T> Clone for ResolutionEvent<T> {
    fn clone(&self) -> Self {
        match self {
            ResolutionEvent::Registered(resolved) => ResolutionEvent::Registered(resolved.clone()),
            ResolutionEvent::Ended => ResolutionEvent::Ended,
        }
    }
}

enum LookupState<T> {
    Found(T),
    Missing { ended: bool },
}

enum TableMessage<T> {
    Register {
        resolved: ResolvedDeclaration<T>,
        reply: oneshot::Sender<Result<(), ResolutionError>>,
    },
    Lookup {
        owner: String,
        signature: Arc<dyn Signature<T>>,
        reply: oneshot::Sender<LookupState<T>>,
    },
    Subscribe {
        reply: oneshot::Sender<broadcast::Receiver<ResolutionEvent<T>>>,
    },
    EndResolution {
        reply: oneshot::Sender<bool>,
    },
    ContainsOwner {
        owner: String,
        reply: oneshot::Sender<bool>,
    },
    DeclarationsNamed {
        owner: String,
        name: String,
        reply: oneshot::Sender<Vec<T>>,
    },
    Snapshot {
        reply: oneshot::Sender<TableSnapshot<T>>,
    },
    PendingLookups {
        reply: oneshot::Sender<usize>,
    },
}

/// Handle to a resolution table; clones share the same table
///
/// The table task stops once every handle has been dropped. Creating a table
/// requires a running tokio runtime.
pub struct ResolutionTable<T> {
    label: &'static str,
    tx: mpsc::UnboundedSender<TableMessage<T>>,
}

impl<T> Clone for ResolutionTable<T> {
    fn clone(&self) -> Self {
        Self {
            label: self.label,
            tx: self.tx.clone(),
        }
    }
}

impl<T> std::fmt::Debug for ResolutionTable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolutionTable")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

impl<T> ResolutionTable<T>
where
    T: Named + Clone + Send + Sync + 'static,
{
    pub fn new(label: &'static str) -> Self {
        Self::with_capacity(label, DEFAULT_EVENT_BUFFER)
    }

    /// Create a table whose registration broadcast buffers `capacity` events
    pub fn with_capacity(label: &'static str, capacity: usize) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(capacity.max(1));

        let actor = TableActor {
            label,
            ended: false,
            buckets: HashMap::new(),
            events,
        };
        tokio::spawn(actor.run(rx));

        Self { label, tx }
    }

    async fn request<R>(
        &self,
        build: impl FnOnce(oneshot::Sender<R>) -> TableMessage<T>,
    ) -> Result<R, ResolutionError> {
        let (reply, response) = oneshot::channel();
        self.tx
            .send(build(reply))
            .map_err(|_| ResolutionError::TableClosed)?;
        response.await.map_err(|_| ResolutionError::TableClosed)
    }

    /// Add a declaration to `owner`'s bucket and broadcast it to waiting lookups
    pub async fn register(&self, owner: impl Into<String>, declaration: T) -> Result<(), ResolutionError> {
        self.register_resolved(ResolvedDeclaration::new(owner, None, declaration))
            .await
    }

    pub async fn register_resolved(&self, resolved: ResolvedDeclaration<T>) -> Result<(), ResolutionError> {
        self.request(|reply| TableMessage::Register { resolved, reply })
            .await?
    }

    /// First declaration under `owner` matching `signature`, in registration order
    ///
    /// Waits while nothing matches and resolution has not ended. Returns
    /// `Ok(None)` once resolution has ended without a match.
    pub async fn lookup<S>(&self, owner: &str, signature: S) -> Result<Option<T>, ResolutionError>
    where
        S: Signature<T> + 'static,
    {
        let signature: Arc<dyn Signature<T>> = Arc::new(signature);

        match self.check(owner, &signature).await? {
            LookupState::Found(declaration) => return Ok(Some(declaration)),
            LookupState::Missing { ended: true } => return Ok(None),
            LookupState::Missing { ended: false } => {}
        }

        let mut events = self
            .request(|reply| TableMessage::Subscribe { reply })
            .await?;

        loop {
            match self.check(owner, &signature).await? {
                LookupState::Found(declaration) => return Ok(Some(declaration)),
                LookupState::Missing { ended: true } => return Ok(None),
                LookupState::Missing { ended: false } => {}
            }

            debug!(
                "{} table: waiting for '{}' under '{}'",
                self.label,
                signature.name(),
                owner
            );

            loop {
                match events.recv().await {
                    Ok(ResolutionEvent::Registered(resolved)) => {
                        if resolved.owner == owner && signature.matches(&resolved.declaration) {
                            return Ok(Some(resolved.declaration.clone()));
                        }
                    }
                    Ok(ResolutionEvent::Ended) => {
                        return match self.check(owner, &signature).await? {
                            LookupState::Found(declaration) => Ok(Some(declaration)),
                            LookupState::Missing { .. } => Ok(None),
                        };
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        debug!(
                            "{} table: lookup for '{}' fell behind by {} registrations, re-checking",
                            self.label,
                            signature.name(),
                            skipped
                        );
                        break;
                    }
                    Err(RecvError::Closed) => return Err(ResolutionError::TableClosed),
                }
            }
        }
    }

    async fn check(
        &self,
        owner: &str,
        signature: &Arc<dyn Signature<T>>,
    ) -> Result<LookupState<T>, ResolutionError> {
        let owner = owner.to_string();
        let signature = signature.clone();
        self.request(|reply| TableMessage::Lookup {
            owner,
            signature,
            reply,
        })
        .await
    }

    /// Stop accepting registrations and settle every waiting lookup
    ///
    /// Returns `true` for the call that actually ended resolution.
    pub async fn end_resolution(&self) -> Result<bool, ResolutionError> {
        self.request(|reply| TableMessage::EndResolution { reply })
            .await
    }

    pub async fn contains_owner(&self, owner: &str) -> Result<bool, ResolutionError> {
        let owner = owner.to_string();
        self.request(|reply| TableMessage::ContainsOwner { owner, reply })
            .await
    }

    /// Every declaration named `name` under `owner`, in registration order
    pub async fn declarations_named(&self, owner: &str, name: &str) -> Result<Vec<T>, ResolutionError> {
        let owner = owner.to_string();
        let name = name.to_string();
        self.request(|reply| TableMessage::DeclarationsNamed { owner, name, reply })
            .await
    }

    /// The whole table; empty until resolution has ended
    pub async fn snapshot(&self) -> Result<TableSnapshot<T>, ResolutionError> {
        self.request(|reply| TableMessage::Snapshot { reply }).await
    }

    /// Number of lookups currently waiting for a registration
    pub async fn pending_lookups(&self) -> Result<usize, ResolutionError> {
        self.request(|reply| TableMessage::PendingLookups { reply })
            .await
    }
}

struct TableActor<T> {
    label: &'static str,
    ended: bool,
    buckets: HashMap<String, HashMap<String, Vec<Arc<ResolvedDeclaration<T>>>>>,
    events: broadcast::Sender<ResolutionEvent<T>>,
}

impl<T> TableActor<T>
where
    T: Named + Clone + Send + Sync + 'static,
{
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<TableMessage<T>>) {
        while let Some(message) = rx.recv().await {
            self.handle(message);
        }
        trace!("{} table: all handles dropped, stopping", self.label);
    }

    fn handle(&mut self, message: TableMessage<T>) {
        match message {
            TableMessage::Register { resolved, reply } => {
                let _ = reply.send(self.register(resolved));
            }
            TableMessage::Lookup {
                owner,
                signature,
                reply,
            } => {
                let state = match self.find(&owner, signature.as_ref()) {
                    Some(declaration) => LookupState::Found(declaration),
                    None => LookupState::Missing { ended: self.ended },
                };
                let _ = reply.send(state);
            }
            TableMessage::Subscribe { reply } => {
                let _ = reply.send(self.events.subscribe());
            }
            TableMessage::EndResolution { reply } => {
                let first = !self.ended;
                if first {
                    self.ended = true;
                    let _ = self.events.send(ResolutionEvent::Ended);
                    info!(
                        "{} table: resolution ended with {} owner(s)",
                        self.label,
                        self.buckets.len()
                    );
                }
                let _ = reply.send(first);
            }
            TableMessage::ContainsOwner { owner, reply } => {
                let _ = reply.send(self.buckets.contains_key(&owner));
            }
            TableMessage::DeclarationsNamed { owner, name, reply } => {
                let found = self
                    .buckets
                    .get(&owner)
                    .and_then(|names| names.get(&name))
                    .map(|list| list.iter().map(|r| r.declaration.clone()).collect())
                    .unwrap_or_default();
                let _ = reply.send(found);
            }
            TableMessage::Snapshot { reply } => {
                let snapshot = if self.ended {
                    self.snapshot()
                } else {
                    warn!(
                        "{} table: read the entire table before resolution ended, returning an empty table",
                        self.label
                    );
                    TableSnapshot::new()
                };
                let _ = reply.send(snapshot);
            }
            TableMessage::PendingLookups { reply } => {
                let _ = reply.send(self.events.receiver_count());
            }
        }
    }

    fn register(&mut self, resolved: ResolvedDeclaration<T>) -> Result<(), ResolutionError> {
        let name = resolved.declaration.name().to_string();
        if self.ended {
            warn!(
                "{} table: rejected '{}' under '{}', resolution already ended",
                self.label, name, resolved.owner
            );
            return Err(ResolutionError::RegistrationClosed {
                owner: resolved.owner,
                name,
            });
        }

        trace!("{} table: registered '{}' under '{}'", self.label, name, resolved.owner);

        let resolved = Arc::new(resolved);
        self.buckets
            .entry(resolved.owner.clone())
            .or_default()
            .entry(name)
            .or_default()
            .push(resolved.clone());

        // No receivers just means no lookup is waiting.
        let _ = self.events.send(ResolutionEvent::Registered(resolved));
        Ok(())
    }

    fn find(&self, owner: &str, signature: &dyn Signature<T>) -> Option<T> {
        self.buckets
            .get(owner)?
            .get(signature.name())?
            .iter()
            .find(|resolved| signature.matches(&resolved.declaration))
            .map(|resolved| resolved.declaration.clone())
    }

    fn snapshot(&self) -> TableSnapshot<T> {
        self.buckets
            .iter()
            .map(|(owner, names)| {
                let names = names
                    .iter()
                    .map(|(name, list)| {
                        (
                            name.clone(),
                            list.iter().map(|r| r.declaration.clone()).collect(),
                        )
                    })
                    .collect();
                (owner.clone(), names)
            })
            .collect()
    }
}
