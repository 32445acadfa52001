use crate::commands::{init, list, new, run, status};

#[derive(Clone, Copy)]
pub struct ExampleGroup {
    pub title: &'static str,
    pub commands: &'static [&'static str],
}

#[derive(Clone, Copy)]
pub struct CommandExample {
    pub name: &'static str,
    pub groups: &'static [ExampleGroup],
}

pub fn command_examples() -> &'static [CommandExample] {
    &[
        CommandExample {
            name: "init",
            groups: init::EXAMPLES,
        },
        CommandExample {
            name: "run",
            groups: run::EXAMPLES,
        },
        CommandExample {
            name: "list",
            groups: list::EXAMPLES,
        },
        CommandExample {
            name: "status",
            groups: status::EXAMPLES,
        },
        CommandExample {
            name: "new",
            groups: new::EXAMPLES,
        },
    ]
}
