//! In-memory relay used by the test suites in place of a live transport.

use std::sync::Mutex;

use crate::relay::client::{RelayClient, RoomOptions};

#[derive(Debug, Clone, PartialEq)]
pub enum RelayCommand {
    Connect,
    JoinLobby,
    CreateRoom { name: String, options: RoomOptions },
    JoinRoom { name: String },
    LeaveRoom,
    Disconnect,
}

/// Records every command issued by the code under test; the test script
/// answers with whatever [`RelayEvent`](crate::relay::RelayEvent)s it wants.
#[derive(Debug, Default)]
pub struct MockRelay {
    commands: Mutex<Vec<RelayCommand>>,
}

impl MockRelay {
    pub fn new() -> MockRelay {
        MockRelay::default()
    }

    pub fn commands(&self) -> Vec<RelayCommand> {
        self.commands.lock().unwrap().clone()
    }

    pub fn take_commands(&self) -> Vec<RelayCommand> {
        std::mem::take(&mut *self.commands.lock().unwrap())
    }

    pub fn last_command(&self) -> Option<RelayCommand> {
        self.commands.lock().unwrap().last().cloned()
    }

    fn record(&self, command: RelayCommand) {
        self.commands.lock().unwrap().push(command);
    }
}

impl RelayClient for MockRelay {
    fn connect(&self) {
        self.record(RelayCommand::Connect);
    }

    fn join_lobby(&self) {
        self.record(RelayCommand::JoinLobby);
    }

    fn create_room(&self, name: &str, options: &RoomOptions) {
        self.record(RelayCommand::CreateRoom {
            name: name.to_owned(),
            options: options.clone(),
        });
    }

    fn join_room(&self, name: &str) {
        self.record(RelayCommand::JoinRoom {
            name: name.to_owned(),
        });
    }

    fn leave_room(&self) {
        self.record(RelayCommand::LeaveRoom);
    }

    fn disconnect(&self) {
        self.record(RelayCommand::Disconnect);
    }
}
