use std::sync::{Arc, Weak};

use crate::{
    core::{Config, ProcessHandler, TerminateHandler},
    hooks::{CapabilityRegistrar, ObserveProcessEnd, ProcessEndFn},
    oracle::{ResponseStatus, SuccessOracle},
    subscribers::{LogWriter, Subscribe, SubscriberSet},
};

/// Builder for constructing a [`ProcessHandler`] with optional collaborators.
pub struct ProcessHandlerBuilder {
    cfg: Config,
    subscribers: Vec<Arc<dyn Subscribe>>,
    oracle: Option<Arc<dyn SuccessOracle>>,
    observers: Option<Vec<Box<dyn ObserveProcessEnd>>>,
}

impl ProcessHandlerBuilder {
    /// Creates a new builder with the given configuration.
    ///
    /// Starts with the built-in [`LogWriter`] as the only subscriber.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            subscribers: vec![Arc::new(LogWriter::new())],
            oracle: None,
            observers: None,
        }
    }

    /// Replaces the event subscribers.
    ///
    /// Subscribers receive task failures, evictions, skips and hook
    /// registration events synchronously, on the thread that caused them.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Adds one subscriber to the current list.
    pub fn add_subscriber(mut self, subscriber: Arc<dyn Subscribe>) -> Self {
        self.subscribers.push(subscriber);
        self
    }

    /// Sets the oracle that gates the terminate stack.
    ///
    /// Defaults to the process-wide [`ResponseStatus`].
    pub fn with_oracle(mut self, oracle: Arc<dyn SuccessOracle>) -> Self {
        self.oracle = Some(oracle);
        self
    }

    /// Replaces the process-end mechanisms probed and registered.
    ///
    /// Defaults to `atexit`, termination signals (feature `signals`) and the
    /// FastCGI request-end hook.
    pub fn with_observers(mut self, observers: Vec<Box<dyn ObserveProcessEnd>>) -> Self {
        self.observers = Some(observers);
        self
    }

    /// Builds the handler and registers its process-end sequence with every
    /// available mechanism.
    ///
    /// Mechanisms hold only a weak reference: once the returned handler is
    /// dropped their triggers do nothing.
    pub fn build(self) -> Arc<ProcessHandler> {
        let Self {
            cfg,
            subscribers,
            oracle,
            observers,
        } = self;

        let subs = Arc::new(SubscriberSet::new(subscribers));
        let oracle = oracle.unwrap_or_else(|| Arc::new(ResponseStatus));
        let terminate = TerminateHandler::with_parts(
            cfg.terminate_capacity_clamped(),
            oracle,
            Arc::clone(&subs),
        );

        let handler = Arc::new_cyclic(|weak: &Weak<ProcessHandler>| {
            let weak = weak.clone();
            let on_end: ProcessEndFn = Arc::new(move || {
                if let Some(handler) = weak.upgrade() {
                    handler.execute_process_end();
                }
            });
            let registrar = match observers {
                Some(observers) => {
                    CapabilityRegistrar::with_observers(on_end, Arc::clone(&subs), observers)
                }
                None => CapabilityRegistrar::new(on_end, Arc::clone(&subs), &cfg),
            };
            ProcessHandler::new_internal(cfg, subs, terminate, registrar)
        });

        handler.registrar.register();
        handler
    }
}

impl std::fmt::Debug for ProcessHandlerBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessHandlerBuilder")
            .field("cfg", &self.cfg)
            .field("subscribers", &self.subscribers.len())
            .field("custom_oracle", &self.oracle.is_some())
            .field("custom_observers", &self.observers.is_some())
            .finish()
    }
}
