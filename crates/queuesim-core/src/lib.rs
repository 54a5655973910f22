//! A discrete-event simulation kernel and station library for modeling
//! queueing networks: sources, servers with finite capacity and patience,
//! delays, routers, batching, and sinks, wired into an arbitrary (possibly
//! cyclic) graph and driven to completion on a single virtual clock.
//!
//! Start with [`Simulator`] for the kernel: it owns virtual time, the
//! pending-event list, the random source, and the arena of stations that
//! make up one run. Build a network by adding stations with
//! [`Simulator::add_station`], wiring each one's successors by
//! [`StationId`] at construction time, then call [`Simulator::run`].
//!
//! For the pieces that make up a station, see [`stations`] (the library of
//! station kinds), [`dist`] (the random-variate generators used for
//! inter-arrival times, service times, and the like), and [`recorder`]
//! (the statistics accumulators every station reports through).
//!
//! ## Example
//! ```
//! use queuesim_core::dist::Dist;
//! use queuesim_core::kernel::Simulator;
//! use queuesim_core::station::StationKind;
//! use queuesim_core::stations::process::ProcessState;
//! use queuesim_core::stations::dispose::DisposeState;
//! use queuesim_core::stations::source::SourceState;
//! use queuesim_core::stations::Discipline;
//!
//! let mut sim = Simulator::with_seed(42);
//!
//! // Stations are wired back-to-front: a station's successor must already
//! // have an id before the station referring to it can be constructed.
//! let dispose = sim.add_station(StationKind::Dispose(DisposeState::new()));
//! let process = sim.add_station(StationKind::Process(
//!     ProcessState::new(
//!         Dist::exponential(8.0).unwrap(),
//!         2,
//!         None,
//!         None,
//!         None,
//!         1,
//!         Discipline::Fifo,
//!         dispose,
//!         None,
//!         None,
//!     )
//!     .unwrap(),
//! ));
//! let source = sim.add_station(StationKind::Source(SourceState::new(
//!     Dist::exponential(10.0).unwrap(),
//!     None,
//!     1000,
//!     None,
//!     process,
//! )));
//! sim.register_init(source);
//!
//! sim.run();
//! ```

pub mod client;
pub mod dist;
pub mod error;
pub mod event;
pub mod kernel;
pub mod recorder;
pub mod rng;
pub mod station;
pub mod stations;

pub use error::Error;
