use roadmate_core::{check_contiguity, column_of, Board, TaskItem, TaskStatus};

fn column(tasks: &[TaskItem], status: TaskStatus) -> Vec<(String, u32)> {
    column_of(tasks, status)
        .into_iter()
        .map(|task| (task.title.clone(), task.sort_index))
        .collect()
}

fn id_of(tasks: &[TaskItem], title: &str) -> uuid::Uuid {
    tasks.iter().find(|task| task.title == title).unwrap().id
}

#[test]
fn cross_column_move_appends_and_closes_gap() {
    let mut tasks = Vec::new();
    let mut board = Board::new(&mut tasks);
    for title in ["A1", "A2", "A3"] {
        board.insert(TaskItem::new(title, TaskStatus::Backlog));
    }
    for title in ["B1", "B2"] {
        board.insert(TaskItem::new(title, TaskStatus::Blocked));
    }

    let a2 = id_of(&tasks, "A2");
    assert!(Board::new(&mut tasks).move_across_columns(a2, TaskStatus::Blocked));

    assert_eq!(
        column(&tasks, TaskStatus::Backlog),
        vec![("A1".into(), 0), ("A3".into(), 1)]
    );
    assert_eq!(
        column(&tasks, TaskStatus::Blocked),
        vec![("B1".into(), 0), ("B2".into(), 1), ("A2".into(), 2)]
    );
}

#[test]
fn move_to_own_column_leaves_indices_unchanged() {
    let mut tasks = Vec::new();
    let mut board = Board::new(&mut tasks);
    for title in ["A", "B", "C"] {
        board.insert(TaskItem::new(title, TaskStatus::InProgress));
    }
    let before = column(&tasks, TaskStatus::InProgress);

    let b = id_of(&tasks, "B");
    let mut board = Board::new(&mut tasks);
    assert!(!board.move_across_columns(b, TaskStatus::InProgress));
    assert!(board.reorder_within_column(TaskStatus::InProgress, 1, 1));

    assert_eq!(column(&tasks, TaskStatus::InProgress), before);
}

#[test]
fn unknown_task_is_a_reported_no_op() {
    let mut tasks = vec![];
    let mut board = Board::new(&mut tasks);
    board.insert(TaskItem::new("A", TaskStatus::Done));

    let ghost = uuid::Uuid::new_v4();
    assert!(!board.move_across_columns(ghost, TaskStatus::Backlog));
    assert!(board.remove_from_column(ghost).is_none());
    assert!(!board.replace_task(TaskItem::new("ghost", TaskStatus::Done)));
    assert_eq!(column(&tasks, TaskStatus::Done), vec![("A".into(), 0)]);
}

#[test]
fn kanban_walkthrough_keeps_columns_contiguous() {
    let mut tasks = Vec::new();
    let mut board = Board::new(&mut tasks);
    for title in ["A", "B", "C"] {
        board.insert(TaskItem::new(title, TaskStatus::Backlog));
    }
    assert_eq!(
        column(&tasks, TaskStatus::Backlog),
        vec![("A".into(), 0), ("B".into(), 1), ("C".into(), 2)]
    );

    let a = id_of(&tasks, "A");
    Board::new(&mut tasks).move_across_columns(a, TaskStatus::InProgress);
    assert_eq!(
        column(&tasks, TaskStatus::Backlog),
        vec![("B".into(), 0), ("C".into(), 1)]
    );
    assert_eq!(
        column(&tasks, TaskStatus::InProgress),
        vec![("A".into(), 0)]
    );

    let b = id_of(&tasks, "B");
    let removed = Board::new(&mut tasks).remove_from_column(b).unwrap();
    assert_eq!(removed.title, "B");
    assert_eq!(column(&tasks, TaskStatus::Backlog), vec![("C".into(), 0)]);
    check_contiguity(&tasks).unwrap();
}

#[test]
fn mixed_operation_sequence_never_breaks_contiguity() {
    let statuses = TaskStatus::ALL;
    let mut tasks = Vec::new();

    for step in 0..40usize {
        let status = statuses[step % statuses.len()];
        let mut board = Board::new(&mut tasks);
        match step % 5 {
            0 | 1 => {
                board.insert(TaskItem::new(format!("t{step}"), status));
            }
            2 => {
                let len = board.column(status).len();
                if len > 0 {
                    board.reorder_within_column(status, step % len, (step * 7) % (len + 2));
                }
            }
            3 => {
                if let Some(task) = tasks.get(step % tasks.len().max(1)) {
                    let id = task.id;
                    Board::new(&mut tasks)
                        .move_across_columns(id, statuses[(step + 1) % statuses.len()]);
                }
            }
            _ => {
                if let Some(task) = tasks.get(step % tasks.len().max(1)) {
                    let id = task.id;
                    Board::new(&mut tasks).remove_from_column(id);
                }
            }
        }
        check_contiguity(&tasks).unwrap();
    }
}

#[test]
fn check_contiguity_names_broken_column() {
    let mut tasks = Vec::new();
    let mut board = Board::new(&mut tasks);
    board.insert(TaskItem::new("A", TaskStatus::Done));
    board.insert(TaskItem::new("B", TaskStatus::Done));
    tasks[1].sort_index = 5;

    let err = check_contiguity(&tasks).unwrap_err();
    assert_eq!(err.status, TaskStatus::Done);
    assert_eq!(err.indices, vec![0, 5]);
}
