use anyhow::anyhow;

/// Whether an in-memory fake of a driven port should behave as if its backing
/// system is reachable. Disconnected fakes fail every call.
pub enum Connectivity {
    Connected,
    Disconnected,
}

impl Connectivity {
    /// Return an error if connectivity is in a "disconnected" state
    pub fn blow_up_if_disconnected(&self) -> Result<(), anyhow::Error> {
        match self {
            Self::Connected => Ok(()),
            Self::Disconnected => Err(anyhow!("could not connect to service!")),
        }
    }
}

/// Records the arguments of every call to a faked function and hands back a canned
/// return value. Mock driving ports wrap a set of these in a [Mutex](std::sync::Mutex)
/// so the `&self` trait methods can record calls.
///
/// * `Args` is whatever the fake captures per call (usually a tuple of cloned arguments)
/// * `Ret` is the function's return type
///
/// ```ignore
/// impl TaskPort for Mutex<MockTaskService> {
///     async fn user_task_by_id(&self, user_id: Uuid, task_id: Uuid, ..) -> Result<Task, TaskError> {
///         let mut locked_self = self.lock().unwrap();
///         locked_self.user_task_by_id_result.save_arguments((user_id, task_id));
///         locked_self.user_task_by_id_result.return_value_result()
///     }
/// }
/// ```
pub struct FakeImplementation<Args, Ret> {
    saved_arguments: Vec<Args>,
    return_value: Option<Ret>,
}

impl<Args, Ret> FakeImplementation<Args, Ret> {
    pub fn new() -> FakeImplementation<Args, Ret> {
        FakeImplementation {
            saved_arguments: Vec::new(),
            return_value: None,
        }
    }

    /// Saves arguments from a single invocation
    pub fn save_arguments(&mut self, arguments: Args) {
        self.saved_arguments.push(arguments)
    }

    /// Arguments of every call made so far, oldest first
    pub fn calls(&self) -> &[Args] {
        self.saved_arguments.as_slice()
    }
}

impl<Args, Success, Fail> FakeImplementation<Args, Result<Success, Fail>>
where
    Success: Clone,
    Fail: Clone,
{
    pub fn set_returned_result(&mut self, return_value: Result<Success, Fail>) {
        self.return_value = Some(return_value);
    }

    pub fn return_value_result(&self) -> Result<Success, Fail> {
        match self.return_value {
            Some(Ok(ref ok_result)) => Ok(ok_result.clone()),
            Some(Err(ref err)) => Err(err.clone()),
            None => panic!("Tried to return from a function where the return value wasn't set!"),
        }
    }
}
