//! The compilation pipeline
//!
//! Units flow through two concurrent stages:
//!
//! ```text
//! input ──▶ parse stage ──DeclaredUnit──▶ compile stage ──CompiledUnit──▶ caller
//!               │   one task per unit          │   one task per unit
//!               └──────────── ErrorSink ───────┴──▶ reporter
//! ```
//!
//! A parse task first declares its unit, then resolves it. Once the input is
//! exhausted and every accepted unit has been declared, resolution ends, so a
//! lookup for a name nobody declared settles instead of waiting forever.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use anyhow::anyhow;
use firefly_codegen::{Backend, ImageBackend, UnitMetadata};
use firefly_core::diagnostics::ErrorSink;
use firefly_core::inliner::{FunctionInliner, StandardFunctionInliner};
use firefly_core::resolution::ResolutionTables;
use firefly_core::unit::{CompilationUnit, CompiledUnit, DeclaredUnit};
use firefly_parser::{AstTranslator, FireflyGrammar, Grammar, ParseContext};
use futures::{FutureExt, Stream, StreamExt};
use tokio::sync::{mpsc, oneshot, OwnedSemaphorePermit, Semaphore};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, warn};

use crate::config::{CompilerConfig, RecoveryStrategy};
use crate::error::{PipelineError, PipelineResult};
use crate::reporter::{ErrorReporter, ReportSummary};

#[derive(Clone)]
pub struct CompilationPipeline {
    config: CompilerConfig,
    grammar: Arc<dyn Grammar>,
    inliner: Arc<dyn FunctionInliner>,
    backend: Arc<dyn Backend>,
}

impl CompilationPipeline {
    pub fn new(config: CompilerConfig) -> PipelineResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            grammar: Arc::new(FireflyGrammar),
            inliner: Arc::new(StandardFunctionInliner::new()),
            backend: Arc::new(ImageBackend::new()),
        })
    }

    pub fn with_backend(mut self, backend: Arc<dyn Backend>) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_grammar(mut self, grammar: Arc<dyn Grammar>) -> Self {
        self.grammar = grammar;
        self
    }

    pub fn with_inliner(mut self, inliner: Arc<dyn FunctionInliner>) -> Self {
        self.inliner = inliner;
        self
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Compile every unit of `input`
    ///
    /// Each call runs with its own resolution tables and reporter. Must be
    /// called from within a tokio runtime.
    pub fn compile<S>(&self, input: S) -> Compilation
    where
        S: Stream<Item = anyhow::Result<CompilationUnit>> + Send + 'static,
    {
        info!(
            "Starting compilation (max parallel units: {:?}, input errors: {:?})",
            self.config.max_parallel_units, self.config.input_errors
        );

        let (errors, error_rx) = ErrorSink::channel();
        let reporter = ErrorReporter::spawn(error_rx);

        let tables = ResolutionTables::with_capacity(self.config.resolution_buffer);
        let translator = Arc::new(
            AstTranslator::new(ParseContext::new(tables.clone(), errors.clone()))
                .with_grammar(self.grammar.clone())
                .with_inliner(self.inliner.clone()),
        );
        let limiter = self
            .config
            .max_parallel_units
            .map(|limit| Arc::new(Semaphore::new(limit)));

        let (declared_tx, declared_rx) = mpsc::channel(self.config.channel_capacity);
        let (compiled_tx, compiled_rx) = mpsc::channel(self.config.channel_capacity);

        let parse = tokio::spawn(parse_stage(
            Box::pin(input),
            ParseStage {
                translator,
                tables,
                declared_tx,
                errors: errors.clone(),
                limiter: limiter.clone(),
                input_errors: self.config.input_errors,
            },
        ));
        let compile = tokio::spawn(compile_stage(
            declared_rx,
            CompileStage {
                backend: self.backend.clone(),
                compiled_tx,
                errors,
                limiter,
            },
        ));

        let finished = tokio::spawn(async move {
            let parsed = parse.await;
            let compiled = compile.await;
            // Every sink lived in the stages, so the reporter drains and ends here.
            let summary = reporter.await??;
            parsed?;
            compiled?;
            info!("Compilation finished with {} error(s)", summary.total());
            Ok::<_, PipelineError>(summary)
        });

        Compilation {
            units: compiled_rx,
            finished,
        }
    }

    pub fn compile_units<I>(&self, units: I) -> Compilation
    where
        I: IntoIterator<Item = CompilationUnit>,
        I::IntoIter: Send + 'static,
    {
        self.compile(futures::stream::iter(units.into_iter().map(anyhow::Ok)))
    }

    /// Compile one unit on its own
    ///
    /// Fails with [`PipelineError::UnitFailed`] when the unit produced no
    /// output; the reasons have been reported by then.
    pub async fn compile_single_unit(&self, unit: CompilationUnit) -> PipelineResult<CompiledUnit> {
        let display_path = unit.display_path();
        let mut compilation = self.compile_units(std::iter::once(unit));
        let compiled = compilation.next_unit().await;
        let summary = compilation.finish().await?;

        compiled.ok_or(PipelineError::UnitFailed {
            unit: display_path,
            errors: summary.total(),
        })
    }
}

/// A running compilation
pub struct Compilation {
    units: mpsc::Receiver<CompiledUnit>,
    finished: JoinHandle<PipelineResult<ReportSummary>>,
}

impl Compilation {
    /// Next compiled unit, in completion order
    pub async fn next_unit(&mut self) -> Option<CompiledUnit> {
        self.units.recv().await
    }

    /// Wait for the pipeline to finish, collecting every compiled unit
    pub async fn collect(mut self) -> PipelineResult<(Vec<CompiledUnit>, ReportSummary)> {
        let mut units = Vec::new();
        while let Some(unit) = self.units.recv().await {
            units.push(unit);
        }
        let summary = self.finished.await??;
        Ok((units, summary))
    }

    /// Wait for the pipeline to finish; units not yet received are discarded
    pub async fn finish(self) -> PipelineResult<ReportSummary> {
        let Compilation { units, finished } = self;
        drop(units);
        finished.await?
    }
}

struct ParseStage {
    translator: Arc<AstTranslator>,
    tables: ResolutionTables,
    declared_tx: mpsc::Sender<DeclaredUnit>,
    errors: ErrorSink,
    limiter: Option<Arc<Semaphore>>,
    input_errors: RecoveryStrategy,
}

async fn parse_stage<S>(mut input: S, stage: ParseStage)
where
    S: Stream<Item = anyhow::Result<CompilationUnit>> + Unpin,
{
    let mut tasks = JoinSet::new();
    let mut declared_signals = Vec::new();

    while let Some(next) = input.next().await {
        match next {
            Ok(unit) => {
                let unit = Arc::new(unit);
                debug!("Accepted {}", unit.display_path());
                let (declared, signal) = oneshot::channel();
                declared_signals.push(signal);
                tasks.spawn(parse_unit(
                    unit,
                    stage.translator.clone(),
                    declared,
                    stage.declared_tx.clone(),
                    stage.errors.clone(),
                    stage.limiter.clone(),
                ));
            }
            Err(err) => {
                stage
                    .errors
                    .parsing(None, err.context("Failed to receive a compilation unit"));
                if stage.input_errors == RecoveryStrategy::FailFast {
                    warn!("Input failed, no further units are accepted");
                    break;
                }
            }
        }
    }
    drop(input);

    let accepted = declared_signals.len();
    info!("Parse stage accepted {} unit(s)", accepted);

    // A dropped sender counts as declared: the task failed before it could.
    for signal in declared_signals {
        let _ = signal.await;
    }
    debug!("All {} unit(s) declared, ending resolution", accepted);
    if let Err(err) = stage.tables.end_resolution().await {
        stage
            .errors
            .parsing(None, anyhow::Error::new(err).context("Failed to end resolution"));
    }

    while let Some(joined) = tasks.join_next().await {
        if let Err(err) = joined {
            stage
                .errors
                .parsing(None, anyhow!("Parse task did not complete: {}", err));
        }
    }
    debug!("Parse stage finished");
}

async fn parse_unit(
    unit: Arc<CompilationUnit>,
    translator: Arc<AstTranslator>,
    declared: oneshot::Sender<()>,
    declared_tx: mpsc::Sender<DeclaredUnit>,
    errors: ErrorSink,
    limiter: Option<Arc<Semaphore>>,
) {
    let work = async {
        let syntax = {
            let _permit = acquire(&limiter).await;
            translator.declare(unit.clone()).await
        };
        let _ = declared.send(());
        translator.resolve(syntax?).await
    };

    match AssertUnwindSafe(work).catch_unwind().await {
        Ok(Ok(declared_unit)) => {
            if declared_tx.send(declared_unit).await.is_err() {
                warn!("Compile stage is gone, dropping {}", unit.display_path());
            }
        }
        Ok(Err(err)) => errors.parsing(
            Some(unit.as_ref()),
            anyhow::Error::new(err).context(format!("Failed to parse {}", unit.display_path())),
        ),
        Err(payload) => errors.parsing(
            Some(unit.as_ref()),
            anyhow!(
                "Parse task for {} panicked: {}",
                unit.display_path(),
                panic_message(payload.as_ref())
            ),
        ),
    }
}

struct CompileStage {
    backend: Arc<dyn Backend>,
    compiled_tx: mpsc::Sender<CompiledUnit>,
    errors: ErrorSink,
    limiter: Option<Arc<Semaphore>>,
}

async fn compile_stage(mut declared_rx: mpsc::Receiver<DeclaredUnit>, stage: CompileStage) {
    let mut tasks = JoinSet::new();
    while let Some(declared) = declared_rx.recv().await {
        tasks.spawn(compile_unit(
            declared,
            stage.backend.clone(),
            stage.compiled_tx.clone(),
            stage.errors.clone(),
            stage.limiter.clone(),
        ));
    }

    let mut generated = 0;
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(true) => generated += 1,
            Ok(false) => {}
            Err(err) => stage
                .errors
                .compilation(None, anyhow!("Compile task did not complete: {}", err)),
        }
    }
    info!("Compile stage generated {} unit(s)", generated);
}

async fn compile_unit(
    declared: DeclaredUnit,
    backend: Arc<dyn Backend>,
    compiled_tx: mpsc::Sender<CompiledUnit>,
    errors: ErrorSink,
    limiter: Option<Arc<Semaphore>>,
) -> bool {
    let unit = declared.unit.clone();
    let generated = {
        let _permit = acquire(&limiter).await;
        let metadata = UnitMetadata::for_unit(&unit);
        std::panic::catch_unwind(AssertUnwindSafe(|| {
            backend.generate(&declared.declaration, &metadata)
        }))
    };

    match generated {
        Ok(Ok(artifacts)) => {
            debug!(
                "Generated {} artifact(s) for {}",
                artifacts.len(),
                unit.display_path()
            );
            if compiled_tx
                .send(CompiledUnit {
                    declared,
                    artifacts,
                })
                .await
                .is_err()
            {
                debug!("Nobody is receiving, dropping {}", unit.display_path());
            }
            true
        }
        Ok(Err(err)) => {
            errors.compilation(
                Some(unit.as_ref()),
                anyhow::Error::new(err)
                    .context(format!("Failed to generate code for {}", unit.display_path())),
            );
            false
        }
        Err(payload) => {
            errors.compilation(
                Some(unit.as_ref()),
                anyhow!(
                    "Code generation for {} panicked: {}",
                    unit.display_path(),
                    panic_message(payload.as_ref())
                ),
            );
            false
        }
    }
}

async fn acquire(limiter: &Option<Arc<Semaphore>>) -> Option<OwnedSemaphorePermit> {
    match limiter {
        Some(semaphore) => semaphore.clone().acquire_owned().await.ok(),
        None => None,
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
