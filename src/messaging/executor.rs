/// Command queue
///
/// Funnels commands from any thread into the audio system's single logical
/// timeline. Senders are cheap to clone; the owner drains once per tick.

use crossbeam_channel::{unbounded, Receiver, Sender};

use super::commands::AudioCommand;

pub struct CommandQueue {
    command_tx: Sender<AudioCommand>,
    command_rx: Receiver<AudioCommand>,
}

impl CommandQueue {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();

        Self {
            command_tx: tx,
            command_rx: rx,
        }
    }

    /// Get a sender for submitting commands
    pub fn sender(&self) -> Sender<AudioCommand> {
        self.command_tx.clone()
    }

    /// Queue a command from the owning thread
    pub fn push(&self, command: AudioCommand) {
        // The queue owns a receiver, so this send cannot fail
        let _ = self.command_tx.send(command);
    }

    /// Take every queued command, in submission order
    pub fn drain(&self) -> Vec<AudioCommand> {
        self.command_rx.try_iter().collect()
    }

    pub fn len(&self) -> usize {
        self.command_rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.command_rx.is_empty()
    }
}

impl Default for CommandQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_command_queue_creation() {
        let queue = CommandQueue::new();

        let sender = queue.sender();
        assert!(sender.send(AudioCommand::KillAll(None)).is_ok());
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_drain_preserves_order() {
        let queue = CommandQueue::new();
        queue.push(AudioCommand::SetMasterVolume(0.5));
        queue.push(AudioCommand::KillAll(Some(1)));

        let drained = queue.drain();
        assert_eq!(
            drained,
            vec![
                AudioCommand::SetMasterVolume(0.5),
                AudioCommand::KillAll(Some(1))
            ]
        );
        assert!(queue.is_empty());
    }

    #[test]
    fn test_commands_from_other_threads() {
        let queue = CommandQueue::new();

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let sender = queue.sender();
                thread::spawn(move || {
                    let _ = sender.send(AudioCommand::SetCategoryVolume {
                        category: i,
                        volume: 0.5,
                    });
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(queue.drain().len(), 4);
    }
}
