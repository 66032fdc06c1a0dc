//! The runtime loop (spec.md §4.7): interleaves the clock interrupt, event
//! dispatch, and single-instruction execution, triggering GC after each
//! thread death. [`Runtime`] owns every piece of process-wide state; nothing
//! here is `Send`/`Sync` on purpose — spec.md §5: "single-threaded,
//! cooperative at instruction granularity".

use ufork_interface::{StateView, Tag, Tracer};

use crate::{
    actor,
    cell::{CellView, Heap},
    clock::Clock,
    console::Console,
    continuation::{Continuation, ContinuationQueue},
    error::Fault,
    gc,
    image::Image,
    opcodes::{self, Effect, ExecCtx},
    queue::EventQueue,
    settings::Settings,
    symbol::SymbolTable,
    word::{CellId, Word},
};

/// One completed loop iteration's worth of bookkeeping, reported back for
/// tests and `ufork-cli`'s `--trace` (not part of any spec contract).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StepReport {
    pub ticks_posted: u32,
    pub dispatched: bool,
    pub executed: bool,
    pub gc: Option<gc::GcStats>,
}

/// The single-threaded actor VM: heap, queues, symbol table, and the I/O
/// devices the runtime loop polls (spec.md §4.7, §6).
pub struct Runtime {
    heap: Heap,
    event_queue: EventQueue,
    cont_queue: ContinuationQueue,
    symtab: SymbolTable,
    console: Box<dyn Console>,
    debug: Box<dyn ufork_interface::DebugSink>,
    clock: Box<dyn Clock>,
    settings: Settings,
    next_tick_deadline: i64,
    threads_since_gc: u32,
    clock_handler: Option<CellId>,
    pinned_roots: Vec<CellId>,
    tracer: Box<dyn Tracer>,
}

impl Runtime {
    /// Loads `image` into a fresh heap sized by `settings.cell_capacity` and
    /// wires up the given I/O devices (spec.md §6).
    pub fn new(
        image: &Image,
        settings: Settings,
        console: Box<dyn Console>,
        debug: Box<dyn ufork_interface::DebugSink>,
        clock: Box<dyn Clock>,
    ) -> Result<Self, Fault> {
        let (heap, event_queue) = crate::image::load(image, settings.cell_capacity)?;
        let now = clock.now_seconds();
        Ok(Self {
            heap,
            event_queue,
            cont_queue: ContinuationQueue::new(),
            symtab: SymbolTable::new(),
            console,
            debug,
            clock,
            settings,
            next_tick_deadline: now + tick_seconds(&settings),
            threads_since_gc: 0,
            clock_handler: None,
            pinned_roots: Vec::new(),
            tracer: Box::new(()),
        })
    }

    /// Installs a [`Tracer`] to observe every instruction the runtime loop
    /// executes from here on (replacing the no-op default). `ufork-cli`'s
    /// `--trace` wires one that prints a [`ContinuationStateView`] snapshot.
    pub fn set_tracer(&mut self, tracer: Box<dyn Tracer>) {
        self.tracer = tracer;
    }

    /// Designates `actor` as the target of clock-tick Events (spec.md §6) and
    /// pins it as a GC root even while it holds no other live reference
    /// (spec.md §4.2: "an auxiliary list of pinned roots, e.g. the clock
    /// handler actor").
    pub fn set_clock_handler(&mut self, actor: CellId) {
        self.clock_handler = Some(actor);
        self.pin_root(actor);
    }

    /// Adds `cell` to the auxiliary pinned-root list (spec.md §4.2), keeping
    /// it alive across GC even once nothing else on the heap points to it —
    /// e.g. a global environment actor an embedder wants to keep addressable
    /// without routing every reference through an Event.
    pub fn pin_root(&mut self, cell: CellId) {
        self.pinned_roots.push(cell);
    }

    #[must_use]
    pub fn heap_stats(&self) -> crate::cell::HeapStats {
        self.heap.stats()
    }

    /// Access to the console device, for a caller that wants to downcast
    /// back to a concrete type (e.g. a scenario test recovering
    /// `BufferConsole::output()`).
    #[must_use]
    pub fn console(&self) -> &dyn Console {
        self.console.as_ref()
    }

    /// Access to the clock device, for a caller that wants to downcast back
    /// to a concrete type (e.g. a scenario test driving a `ManualClock`
    /// forward mid-run).
    pub fn clock_mut(&mut self) -> &mut dyn Clock {
        self.clock.as_mut()
    }

    /// Allocates a cons cell directly on the runtime's heap, for an embedder
    /// building a structured message payload ahead of
    /// [`post_event`](Self::post_event) (spec.md §2: "an external world
    /// deposits events").
    pub fn alloc_cons(&mut self, car: Word, cdr: Word) -> Result<CellId, Fault> {
        self.heap.cons(car, cdr)
    }

    /// Enqueues an externally-originated Event targeting `actor`, beyond
    /// whatever the loaded image's own seed Event already queued. Mirrors
    /// what [`Runtime::poll_clock`] does internally for tick events.
    pub fn post_event(&mut self, actor: CellId, message: Word) -> Result<(), Fault> {
        let event = self.heap.alloc(
            Word::Const(crate::word::ProcConst::Tag(Tag::Event)),
            Word::from(actor),
            message,
            Word::UNDEF,
        )?;
        self.event_queue.push_back(&mut self.heap, event);
        Ok(())
    }

    /// `true` once neither queue holds any work. A runtime can still be
    /// woken by a future clock tick even while idle.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.event_queue.is_empty() && self.cont_queue.is_empty()
    }

    /// Runs exactly one loop iteration: interrupt poll, dispatch, execute
    /// (spec.md §4.7).
    pub fn step(&mut self) -> Result<StepReport, Fault> {
        let mut report = StepReport::default();
        report.ticks_posted = self.poll_clock()?;

        if self.dispatch_one()? {
            report.dispatched = true;
        }

        if let Some(cont) = self.cont_queue.pop_front() {
            report.executed = true;
            report.gc = self.execute_one(cont)?;
        }

        Ok(report)
    }

    /// Runs [`step`](Self::step) until both queues are empty, or until
    /// `max_steps` iterations have elapsed (whichever comes first) — a
    /// safety valve for a program that never terminates on its own.
    pub fn run_until_idle(&mut self, max_steps: usize) -> Result<(), Fault> {
        for _ in 0..max_steps {
            if self.is_idle() {
                return Ok(());
            }
            self.step()?;
        }
        Ok(())
    }

    /// Posts one clock-tick Event per whole second elapsed since the last
    /// deadline (spec.md §4.7 step 1). Returns how many were posted.
    fn poll_clock(&mut self) -> Result<u32, Fault> {
        let mut posted = 0;
        let tick = tick_seconds(&self.settings);
        while self.clock.now_seconds() >= self.next_tick_deadline {
            if let Some(handler) = self.clock_handler {
                let event = self.heap.alloc(
                    Word::Const(crate::word::ProcConst::Tag(Tag::Event)),
                    Word::from(handler),
                    Word::Fixnum(self.next_tick_deadline as crate::word::Raw),
                    Word::UNDEF,
                )?;
                self.event_queue.push_back(&mut self.heap, event);
            }
            self.next_tick_deadline += tick;
            posted += 1;
        }
        Ok(posted)
    }

    /// spec.md §4.7 step 2: pop the head event, begin a transaction if its
    /// target actor is ready, defer it otherwise. Loops internally on a
    /// deferral-then-immediate-retry (an actor that just finished a prior
    /// transaction and is now ready again) so one call to `step` always
    /// attempts dispatch exactly once per distinct head event.
    fn dispatch_one(&mut self) -> Result<bool, Fault> {
        let Some(event) = self.event_queue.pop_front(&self.heap) else {
            return Ok(false);
        };
        let CellView::Event { target, .. } = self.heap.cell(event).view() else {
            panic!("event queue head {event:?} is not an Event cell");
        };

        let actor_id = match target {
            Word::Ptr(id) if self.heap.cell(id).tag() == Some(Tag::Actor) => id,
            _ => {
                self.handle_non_actor_target(event)?;
                return Ok(true);
            }
        };

        if actor::is_busy(&self.heap, actor_id) {
            self.event_queue.push_back(&mut self.heap, event);
            return Ok(true);
        }

        actor::begin(&mut self.heap, actor_id);
        let CellView::Actor { behavior, state, .. } = self.heap.cell(actor_id).view() else {
            unreachable!("checked Tag::Actor above");
        };
        self.cont_queue
            .push_back(Continuation::new(behavior, state, event));
        Ok(true)
    }

    /// spec.md §7 tier 3: a non-actor send target is handled by a default
    /// Undef dispatch rather than rejected outright. Resolved here (an Open
    /// Question per spec.md §9) as: if the message is a Pair, treat its `car`
    /// as a customer and notify it with `UNDEF`; otherwise the event is
    /// silently dropped. Either way the malformed event cell is freed.
    fn handle_non_actor_target(&mut self, event: CellId) -> Result<(), Fault> {
        let CellView::Event { message, .. } = self.heap.cell(event).view() else {
            panic!("event {event:?} is not an Event cell");
        };
        if let CellView::Pair { car: customer, .. } = Self::as_pair(&self.heap, message) {
            if let Word::Ptr(id) = customer {
                if self.heap.cell(id).tag() == Some(Tag::Actor) {
                    let notice = self.heap.alloc(
                        Word::Const(crate::word::ProcConst::Tag(Tag::Event)),
                        customer,
                        Word::UNDEF,
                        Word::UNDEF,
                    )?;
                    self.event_queue.push_back(&mut self.heap, notice);
                }
            }
        }
        self.heap.free(event);
        Ok(())
    }

    fn as_pair(heap: &Heap, w: Word) -> CellView {
        match w {
            Word::Ptr(id) => heap.cell(id).view(),
            _ => CellView::Undef,
        }
    }

    /// spec.md §4.7 step 3: execute exactly one instruction of `cont`. On
    /// thread death, performs the actor's terminal bookkeeping, frees the
    /// consumed event, and triggers a GC cycle per
    /// [`Settings::gc_after_every_n_threads`]; on survival, re-queues `cont`.
    fn execute_one(&mut self, mut cont: Continuation) -> Result<Option<gc::GcStats>, Fault> {
        let Word::Ptr(ip) = cont.ip else {
            panic!("continuation ip {:?} is not an instruction cell", cont.ip);
        };
        let CellView::Instr { op, .. } = self.heap.cell(ip).view() else {
            panic!("continuation ip {ip:?} is not an instruction cell");
        };
        self.tracer
            .before_instruction(op, &ContinuationStateView { heap: &self.heap, cont: &cont });

        let mut ctx = ExecCtx {
            heap: &mut self.heap,
            symtab: &mut self.symtab,
            console: self.console.as_mut(),
            debug: self.debug.as_mut(),
        };
        let effect = opcodes::execute(&mut ctx, &mut cont)?;

        match effect {
            Effect::Continue(next_ip) => {
                cont.ip = next_ip;
                self.tracer.after_instruction(
                    op,
                    &ContinuationStateView { heap: &self.heap, cont: &cont },
                );
                self.cont_queue.push_back(cont);
                Ok(None)
            }
            Effect::End(kind) => {
                self.tracer
                    .after_instruction(op, &ContinuationStateView { heap: &self.heap, cont: &cont });
                self.terminate(cont, kind)
            }
        }
    }

    fn terminate(
        &mut self,
        cont: Continuation,
        kind: ufork_interface::EndKind,
    ) -> Result<Option<gc::GcStats>, Fault> {
        use ufork_interface::EndKind;

        let CellView::Event { target, .. } = self.heap.cell(cont.ep).view() else {
            panic!("continuation ep {:?} is not an Event cell", cont.ep);
        };
        let self_actor = target
            .ptr()
            .filter(|&id| self.heap.cell(id).tag() == Some(Tag::Actor));

        if let Some(actor_id) = self_actor {
            match kind {
                EndKind::Commit => actor::commit(&mut self.heap, &mut self.event_queue, actor_id, cont.txn),
                EndKind::Release => {
                    actor::release(&mut self.heap, &mut self.event_queue, actor_id, cont.txn);
                }
                // `stop` and `abort` both discard the staged transaction and
                // leave the actor ready; `abort` additionally implies there
                // may have been staged events to discard, but the clearing
                // operation is identical either way.
                EndKind::Stop | EndKind::Abort => actor::abort(&mut self.heap, actor_id),
            }
        }
        self.heap.free(cont.ep);

        self.threads_since_gc += 1;
        if self.threads_since_gc >= self.settings.gc_after_every_n_threads.max(1) {
            let roots: Vec<CellId> = self
                .symtab
                .roots()
                .chain(self.event_queue.roots())
                .chain(self.cont_queue.event_roots())
                .chain(self.cont_queue.stack_roots())
                .chain(self.cont_queue.ip_roots())
                .chain(self.pinned_roots.iter().copied())
                .collect();
            let stats = gc::collect(&mut self.heap, roots)?;
            self.symtab.retain_live(&self.heap);
            self.threads_since_gc = 0;
            Ok(Some(stats))
        } else {
            Ok(None)
        }
    }
}

fn tick_seconds(settings: &Settings) -> i64 {
    settings.clock_tick.as_secs().max(1) as i64
}

/// A [`StateView`] over a running [`Continuation`], for `ufork-cli`'s
/// `--trace` and any external tracer (spec.md §6-adjacent; not itself part
/// of the core spec, but the seam `ufork-interface::Tracer` is defined for).
pub struct ContinuationStateView<'a> {
    pub heap: &'a Heap,
    pub cont: &'a Continuation,
}

impl StateView for ContinuationStateView<'_> {
    fn ip(&self) -> usize {
        match self.cont.ip {
            Word::Ptr(id) => id.as_u32() as usize,
            _ => usize::MAX,
        }
    }

    fn sp(&self) -> usize {
        match self.cont.sp {
            Word::Ptr(id) => id.as_u32() as usize,
            _ => CellId::NIL.as_u32() as usize,
        }
    }

    fn ep(&self) -> usize {
        self.cont.ep.as_u32() as usize
    }

    fn self_actor(&self) -> usize {
        match self.heap.cell(self.cont.ep).view() {
            CellView::Event { target: Word::Ptr(id), .. } => id.as_u32() as usize,
            _ => CellId::NIL.as_u32() as usize,
        }
    }

    fn stack_depth(&self) -> usize {
        crate::opcodes::common::depth(self.heap, self.cont.sp).unwrap_or(0) as usize
    }
}
