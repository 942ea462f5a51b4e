//! Cooperative, timer-preemptible round-robin scheduler.
//!
//! Tasks live in a fixed-size arena rather than behind raw pointers,
//! threaded into a circular singly-linked ring via `next: Option<usize>`
//! indices. `schedule` always runs with interrupts already disabled: it
//! is reached either from `timer_interrupt_handler` (CPU clears IF on
//! interrupt-gate entry) or from `yield_now`'s `int 0x20`, which enters
//! through the same gate.
//!
//! A freshly created task's stack is prefabricated to look exactly like
//! a task that was interrupted mid-instruction: eight zeroed
//! general-purpose register slots underneath a hardware interrupt frame
//! (EFLAGS, CS, EIP). `switch_task` saves the outgoing task's registers
//! the same way a real IRQ trampoline would, so one primitive handles
//! both "resume a task that was really preempted" and "start a task for
//! the first time".

use crate::interrupts::gdt::KERNEL_CODE_SELECTOR;
use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use spin::Mutex;

const MAX_TASKS: usize = 64;
const STACK_SIZE: usize = 4096;

/// `EFLAGS` with only the reserved bit 1 and `IF` (interrupts enabled)
/// set, matching the value the reference scheduler prefabricates.
const INITIAL_EFLAGS: u32 = 0x0202;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Running,
    Ready,
    Sleeping,
    Dead,
}

struct Task {
    id: u32,
    name: String,
    stack_base: usize,
    saved_sp: usize,
    entry_fn: Option<fn()>,
    state: TaskState,
    next: Option<usize>,
}

pub struct TaskSnapshot {
    pub id: u32,
    pub name: String,
    pub state: TaskState,
}

struct TaskTable {
    tasks: [Option<Task>; MAX_TASKS],
    current: Option<usize>,
    next_id: u32,
}

const NONE_TASK: Option<Task> = None;

static TASKS: Mutex<TaskTable> = Mutex::new(TaskTable { tasks: [NONE_TASK; MAX_TASKS], current: None, next_id: 0 });

unsafe extern "C" {
    /// Implemented outside this crate: pushes the eight general-purpose
    /// registers, stores the resulting stack pointer through
    /// `old_esp`, loads `new_esp`, pops eight registers, then `iret`s.
    fn switch_task(old_esp: *mut usize, new_esp: usize);
}

/// Creates task 0, representing the thread of execution already
/// running at boot (the one calling this function).
///
/// # Safety
/// Must be called exactly once, before `create_task` or `schedule`.
pub unsafe fn init() {
    crate::without_interrupts!({
        let mut table = TASKS.lock();
        let id = table.next_id;
        table.next_id += 1;
        table.tasks[0] = Some(Task {
            id,
            name: String::from("kmain"),
            stack_base: 0,
            saved_sp: 0,
            entry_fn: None,
            state: TaskState::Running,
            next: Some(0),
        });
        table.current = Some(0);
    });
}

/// Allocates a 4 KiB stack for `entry`, prefabricates an iret frame on
/// it, and splices it into the ring right after the currently running
/// task. Returns the new task's id, or `None` if the arena is full.
pub fn create_task(entry: fn(), name: &str) -> Option<u32> {
    crate::without_interrupts!({
        let mut table = TASKS.lock();
        let slot = (0..MAX_TASKS).find(|&i| table.tasks[i].is_none())?;

        let stack: Box<[u8; STACK_SIZE]> = Box::new([0; STACK_SIZE]);
        let stack_base = Box::into_raw(stack) as usize;
        let mut sp = stack_base + STACK_SIZE;

        sp -= 4;
        unsafe {
            *(sp as *mut u32) = INITIAL_EFLAGS;
        }
        sp -= 4;
        unsafe {
            *(sp as *mut u32) = KERNEL_CODE_SELECTOR as u32;
        }
        sp -= 4;
        unsafe {
            *(sp as *mut u32) = task_trampoline as usize as u32;
        }
        for _ in 0..8 {
            sp -= 4;
            unsafe {
                *(sp as *mut u32) = 0;
            }
        }

        let id = table.next_id;
        table.next_id += 1;

        let cur = table.current.expect("task::init must run before create_task");
        let cur_next = table.tasks[cur].as_ref().unwrap().next;

        table.tasks[slot] = Some(Task {
            id,
            name: String::from(name),
            stack_base,
            saved_sp: sp,
            entry_fn: Some(entry),
            state: TaskState::Ready,
            next: cur_next,
        });
        table.tasks[cur].as_mut().unwrap().next = Some(slot);

        Some(id)
    })
}

extern "C" fn task_trampoline() -> ! {
    crate::interrupts::enable_interrupts();

    let entry = {
        let table = TASKS.lock();
        let cur = table.current.expect("task::init must run before any task executes");
        table.tasks[cur].as_ref().unwrap().entry_fn
    };

    if let Some(entry) = entry {
        entry();
    }

    {
        let mut table = TASKS.lock();
        let cur = table.current.expect("task::init must run before any task executes");
        table.tasks[cur].as_mut().unwrap().state = TaskState::Dead;
    }

    loop {
        yield_now();
    }
}

fn free_stack(stack_base: usize) {
    if stack_base == 0 {
        return;
    }
    unsafe {
        drop(Box::from_raw(stack_base as *mut [u8; STACK_SIZE]));
    }
}

/// Reaps every `Dead` task immediately following the running one, then
/// switches to the next `Ready` task in the ring. A no-op if the ring
/// has nowhere else to go.
///
/// Callers must already have interrupts disabled (see the module docs).
pub fn schedule() {
    let mut table = TASKS.lock();
    let Some(cur) = table.current else { return };

    loop {
        let next_idx = table.tasks[cur].as_ref().unwrap().next.expect("task ring must be closed");
        if next_idx == cur {
            break;
        }

        let is_dead = matches!(table.tasks[next_idx].as_ref().unwrap().state, TaskState::Dead);
        if !is_dead {
            break;
        }

        let zombie = table.tasks[next_idx].take().unwrap();
        table.tasks[cur].as_mut().unwrap().next = zombie.next;
        free_stack(zombie.stack_base);
    }

    let next_idx = table.tasks[cur].as_ref().unwrap().next.unwrap();
    if next_idx == cur {
        return;
    }

    table.tasks[cur].as_mut().unwrap().state = TaskState::Ready;
    table.tasks[next_idx].as_mut().unwrap().state = TaskState::Running;
    table.current = Some(next_idx);

    let old_sp: *mut usize = &mut table.tasks[cur].as_mut().unwrap().saved_sp;
    let new_sp = table.tasks[next_idx].as_ref().unwrap().saved_sp;

    // `old_sp` points into the static `TASKS` array, not into anything
    // the mutex guard owns, so it stays valid once the lock is
    // released; `switch_task` never returns until some future switch
    // resumes this exact stack, so the lock must not still be held.
    drop(table);

    unsafe {
        switch_task(old_sp, new_sp);
    }
}

/// Called by `timer_interrupt_handler` on every IRQ0.
pub fn on_timer_tick() {
    schedule();
}

/// Voluntarily gives up the remainder of the current time slice.
pub fn yield_now() {
    unsafe {
        core::arch::asm!("int 0x20", options(nomem, nostack));
    }
}

/// A snapshot of every task currently in the ring, starting from the
/// one that is running, for a shell's `ps`-style listing.
pub fn enumerate() -> Vec<TaskSnapshot> {
    crate::without_interrupts!({
        let table = TASKS.lock();
        let mut result = Vec::new();

        let Some(start) = table.current else { return result };
        let mut idx = start;

        loop {
            let Some(task) = &table.tasks[idx] else { break };
            result.push(TaskSnapshot { id: task.id, name: task.name.clone(), state: task.state });

            match task.next {
                Some(next) if next != start => idx = next,
                _ => break,
            }
        }

        result
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::{AtomicUsize, Ordering};

    static RAN: AtomicUsize = AtomicUsize::new(0);

    fn bump_counter() {
        RAN.fetch_add(1, Ordering::SeqCst);
    }

    #[test_case]
    fn create_task_splices_into_the_ring_after_current() {
        let before = enumerate().len();
        let id = create_task(bump_counter, "counter").expect("task arena must have room");
        let after = enumerate();
        assert_eq!(after.len(), before + 1);
        assert!(after.iter().any(|t| t.id == id && t.name == "counter"));
    }
}
