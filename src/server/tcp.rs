//! # Servidor TCP Concurrente
//! src/server/tcp.rs
//!
//! Accept loop con admisión acotada. Cada conexión aceptada espera un
//! permiso del semáforo y luego pasa al pool de workers, que la lee, la
//! despacha, escribe la respuesta y la cierra.
//!
//! ```text
//! listener.incoming()
//!     → semaphore.acquire()        (bloquea con N conexiones en proceso)
//!     → pool.execute(Admitted)
//!         → read_request → dispatcher → write → close → drop(permit)
//! ```

use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::dispatch::Dispatcher;
use crate::error::{ConnectionError, ServerError};
use crate::hits::HitCounter;
use crate::server::admission::{AdmissionGauge, AdmissionSemaphore, Permit};
use crate::server::pool::WorkerPool;

/// Tamaño de cada lectura del socket
pub const READ_CHUNK: usize = 4096;

/// Máximo de bytes que se leen de un request
pub const MAX_REQUEST_BYTES: usize = 64 * 1024;

/// Conexión admitida en camino a un worker
///
/// Los campos se destruyen en orden de declaración: el socket se cierra
/// antes de liberar el permiso.
struct Admitted {
    stream: TcpStream,
    peer: SocketAddr,
    permit: Permit,
}

/// Servidor de archivos concurrente
pub struct Server {
    listener: TcpListener,
    dispatcher: Arc<Dispatcher>,
    semaphore: AdmissionSemaphore,
    gauge: Arc<AdmissionGauge>,
    workers: usize,
}

impl Server {
    /// Valida la configuración, arma los componentes y abre el puerto
    pub fn bind(config: &Config) -> Result<Self, ServerError> {
        config.validate().map_err(ServerError::InvalidConfig)?;

        let dispatcher = Dispatcher::from_config(config)?;
        let address = config.address();
        let listener = TcpListener::bind(&address).map_err(|source| ServerError::Bind {
            addr: address.clone(),
            source,
        })?;

        info!(%address, workers = config.workers, "Servidor escuchando");

        Ok(Self::from_parts(listener, dispatcher, config.workers))
    }

    /// Construye el servidor sobre un listener ya abierto
    pub fn from_parts(listener: TcpListener, dispatcher: Dispatcher, workers: usize) -> Self {
        Self {
            listener,
            dispatcher: Arc::new(dispatcher),
            semaphore: AdmissionSemaphore::new(workers),
            gauge: Arc::new(AdmissionGauge::new()),
            workers,
        }
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Contador de visitas compartido con los workers
    pub fn hits(&self) -> Arc<HitCounter> {
        self.dispatcher.hits()
    }

    /// Medidor de handlers en ejecución
    pub fn gauge(&self) -> Arc<AdmissionGauge> {
        Arc::clone(&self.gauge)
    }

    /// Accept loop. No retorna en operación normal; si el pool muere
    /// devuelve `ServerError::PoolClosed`.
    pub fn run(self) -> Result<(), ServerError> {
        let pool = {
            let dispatcher = Arc::clone(&self.dispatcher);
            let gauge = Arc::clone(&self.gauge);
            WorkerPool::new(self.workers, move |job: Admitted| {
                serve_admitted(job, &dispatcher, &gauge)
            })
            .map_err(ServerError::WorkerSpawn)?
        };

        info!(
            workers = pool.size(),
            mode = %self.dispatcher.hits().mode(),
            "Aceptando conexiones"
        );

        for stream in self.listener.incoming() {
            let stream = match stream {
                Ok(stream) => stream,
                Err(e) => {
                    warn!(error = %e, "Error al aceptar conexión");
                    continue;
                }
            };

            let peer = match stream.peer_addr() {
                Ok(peer) => peer,
                Err(e) => {
                    warn!(error = %e, "Conexión sin dirección remota");
                    continue;
                }
            };

            let permit = self.semaphore.acquire();
            debug!(%peer, available = self.semaphore.available(), "Conexión admitida");

            if pool
                .execute(Admitted {
                    stream,
                    peer,
                    permit,
                })
                .is_err()
            {
                error!("El pool de workers dejó de aceptar trabajo");
                return Err(ServerError::PoolClosed);
            }
        }

        Ok(())
    }
}

/// Cuerpo de cada worker; los errores de la conexión se registran aquí
fn serve_admitted(job: Admitted, dispatcher: &Dispatcher, gauge: &AdmissionGauge) {
    let Admitted {
        stream,
        peer,
        permit,
    } = job;
    let in_flight = gauge.enter();

    if let Err(e) = handle_connection(stream, peer, dispatcher) {
        warn!(error = %e, "Conexión terminada con error");
    }

    drop(in_flight);
    drop(permit);
}

/// Lee un request, lo despacha y escribe la respuesta
///
/// El socket se cierra al salir de la función, sin importar el resultado.
fn handle_connection(
    mut stream: TcpStream,
    peer: SocketAddr,
    dispatcher: &Dispatcher,
) -> Result<(), ConnectionError> {
    let start = Instant::now();

    let raw = read_request(&mut stream).map_err(|source| ConnectionError::Read { peer, source })?;

    let response = dispatcher.dispatch(&raw, peer.ip());

    stream
        .write_all(&response.to_bytes())
        .and_then(|_| stream.flush())
        .map_err(|source| ConnectionError::Write { peer, source })?;

    info!(
        %peer,
        request = %request_line(&raw),
        status = response.status().as_u16(),
        bytes = response.body().len(),
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        "Request atendido"
    );

    Ok(())
}

/// Lee hasta `\r\n\r\n`, hasta `MAX_REQUEST_BYTES` o hasta que el peer cierre
///
/// Lo que llegue después del terminador se descarta.
fn read_request(stream: &mut impl Read) -> io::Result<Vec<u8>> {
    let mut data = Vec::new();
    let mut chunk = [0u8; READ_CHUNK];

    while data.len() < MAX_REQUEST_BYTES && find_terminator(&data).is_none() {
        let wanted = READ_CHUNK.min(MAX_REQUEST_BYTES - data.len());
        match stream.read(&mut chunk[..wanted]) {
            Ok(0) => break,
            Ok(n) => data.extend_from_slice(&chunk[..n]),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }

    if let Some(end) = find_terminator(&data) {
        data.truncate(end + 4);
    }

    Ok(data)
}

fn find_terminator(data: &[u8]) -> Option<usize> {
    data.windows(4).position(|w| w == b"\r\n\r\n")
}

/// Primera línea del request, para el log
fn request_line(raw: &[u8]) -> String {
    let end = raw
        .windows(2)
        .position(|w| w == b"\r\n")
        .unwrap_or(raw.len());
    String::from_utf8_lossy(&raw[..end]).into_owned()
}
