use crate::kmlib::{KmError, KmResult};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::any::Any;

/// Rank that owns the dataset and the authoritative centroids
pub const COORDINATOR: usize = 0;

/// Synchronized exchange among a fixed group of workers.
///
/// Every member of the group must make the same sequence of calls with the
/// same `root`. The root returns only once every peer has its copy or piece;
/// a non-root returns as soon as its own share has arrived.
/// Arguments that only matter on the root (the value to broadcast, the pieces
/// to scatter) are `None` everywhere else.
pub trait Collective {
    fn rank(&self) -> usize;

    fn size(&self) -> usize;

    fn is_coordinator(&self) -> bool {
        self.rank() == COORDINATOR
    }

    /// Root's value is copied to every worker
    fn broadcast<T: Clone + Send + 'static>(&self, root: usize, value: Option<T>) -> KmResult<T>;

    /// Root hands piece `i` to rank `i`
    fn scatter<T: Send + 'static>(&self, root: usize, pieces: Option<Vec<T>>) -> KmResult<T>;

    /// Root receives every worker's value in rank order. Others get `None`.
    fn gather<T: Send + 'static>(&self, root: usize, value: T) -> KmResult<Option<Vec<T>>>;
}

type Parcel = Box<dyn Any + Send>;

/// In-process collective over a full mesh of rendezvous channels.
/// A send only completes once the peer has taken the parcel, so every
/// operation doubles as a synchronization point.
pub struct ChannelCollective {
    rank: usize,
    size: usize,
    // Indexed by peer rank; our own slot is empty
    outbox: Vec<Option<Sender<Parcel>>>,
    inbox: Vec<Option<Receiver<Parcel>>>,
}

impl ChannelCollective {
    /// Build the endpoints for a group of `size` workers, in rank order
    pub fn group(size: usize) -> Vec<ChannelCollective> {
        let mut outboxes: Vec<Vec<Option<Sender<Parcel>>>> =
            (0..size).map(|_| (0..size).map(|_| None).collect()).collect();
        let mut inboxes: Vec<Vec<Option<Receiver<Parcel>>>> =
            (0..size).map(|_| (0..size).map(|_| None).collect()).collect();

        for src in 0..size {
            for dst in 0..size {
                if src != dst {
                    let (tx, rx) = bounded(0);
                    outboxes[src][dst] = Some(tx);
                    inboxes[dst][src] = Some(rx);
                }
            }
        }

        outboxes
            .into_iter()
            .zip(inboxes)
            .enumerate()
            .map(|(rank, (outbox, inbox))| ChannelCollective {
                rank,
                size,
                outbox,
                inbox,
            })
            .collect()
    }

    fn fault(&self, op: &'static str, reason: String) -> KmError {
        KmError::Collective {
            op,
            rank: self.rank,
            reason,
        }
    }

    fn check_root(&self, op: &'static str, root: usize) -> KmResult<()> {
        if root >= self.size {
            return Err(self.fault(
                op,
                format!("root {} outside group of {}", root, self.size),
            ));
        }
        Ok(())
    }

    fn send(&self, op: &'static str, dst: usize, parcel: Parcel) -> KmResult<()> {
        let tx = self.outbox[dst]
            .as_ref()
            .ok_or_else(|| self.fault(op, format!("no route to rank {}", dst)))?;
        tx.send(parcel)
            .map_err(|_| self.fault(op, format!("rank {} hung up", dst)))
    }

    fn recv<T: 'static>(&self, op: &'static str, src: usize) -> KmResult<T> {
        let rx = self.inbox[src]
            .as_ref()
            .ok_or_else(|| self.fault(op, format!("no route from rank {}", src)))?;
        let parcel = rx
            .recv()
            .map_err(|_| self.fault(op, format!("rank {} hung up", src)))?;
        parcel
            .downcast::<T>()
            .map(|value| *value)
            .map_err(|_| self.fault(op, format!("unexpected payload from rank {}", src)))
    }
}

impl Collective for ChannelCollective {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn broadcast<T: Clone + Send + 'static>(&self, root: usize, value: Option<T>) -> KmResult<T> {
        self.check_root("broadcast", root)?;
        if self.rank != root {
            return self.recv("broadcast", root);
        }

        let value =
            value.ok_or_else(|| self.fault("broadcast", "root has nothing to send".to_string()))?;
        for dst in (0..self.size).filter(|&dst| dst != root) {
            self.send("broadcast", dst, Box::new(value.clone()))?;
        }
        Ok(value)
    }

    fn scatter<T: Send + 'static>(&self, root: usize, pieces: Option<Vec<T>>) -> KmResult<T> {
        self.check_root("scatter", root)?;
        if self.rank != root {
            return self.recv("scatter", root);
        }

        let pieces =
            pieces.ok_or_else(|| self.fault("scatter", "root has nothing to send".to_string()))?;
        if pieces.len() != self.size {
            return Err(self.fault(
                "scatter",
                format!("{} pieces for {} workers", pieces.len(), self.size),
            ));
        }

        let mut own = None;
        for (dst, piece) in pieces.into_iter().enumerate() {
            if dst == root {
                own = Some(piece);
            } else {
                self.send("scatter", dst, Box::new(piece))?;
            }
        }
        own.ok_or_else(|| self.fault("scatter", "no piece for root".to_string()))
    }

    fn gather<T: Send + 'static>(&self, root: usize, value: T) -> KmResult<Option<Vec<T>>> {
        self.check_root("gather", root)?;
        if self.rank != root {
            self.send("gather", root, Box::new(value))?;
            return Ok(None);
        }

        let mut own = Some(value);
        let mut gathered = Vec::with_capacity(self.size);
        for src in 0..self.size {
            if src == root {
                gathered.extend(own.take());
            } else {
                gathered.push(self.recv("gather", src)?);
            }
        }
        Ok(Some(gathered))
    }
}
